// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid product key '{0}': expected identifier/version/arch")]
    InvalidProductKey(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
