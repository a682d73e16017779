use thiserror::Error;
use uuid::Uuid;

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Save blocked: {count} license(s) below active user count")]
    ConflictsBlockSave { count: usize },

    #[error("Cannot {action} while session is {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("License line not found: {0}")]
    UnknownLicense(Uuid),

    #[error("No subscription for customer {0}")]
    UnknownCustomer(Uuid),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Billing sync error: {0}")]
    Sync(String),
}

impl From<config::ConfigError> for AdminError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
