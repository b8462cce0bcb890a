//! Error types for the OasisX tooling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Typed data error: {message}")]
    TypedData { message: String },

    #[error("Invalid signature: {message}")]
    Signature { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected RPC response: {message}")]
    Response { message: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Invalid amount: {message}")]
    Amount { message: String },

    #[error("Deployment error: {message}")]
    Deployment { message: String },
}

impl Error {
    pub(crate) fn typed_data(message: impl Into<String>) -> Self {
        Error::TypedData {
            message: message.into(),
        }
    }

    pub(crate) fn response(message: impl Into<String>) -> Self {
        Error::Response {
            message: message.into(),
        }
    }

    /// True for failures reported by the chain itself (RPC error objects and reverts).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rpc { .. } | Error::Reverted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
