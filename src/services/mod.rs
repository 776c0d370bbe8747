pub mod allocation;
pub mod cleanup;
pub mod ledger;

use thiserror::Error;

// Ошибки доменного слоя. Маппинг в HTTP-статусы живёт в controllers::to_api_error
#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InsufficientFunds(String),
}
