use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON-RPC error {code}: {message}")]
    RpcResponse { code: i64, message: String },
    #[error("Missing field in RPC result: {0}")]
    MissingField(&'static str),
    #[error("Invalid hex value: {0}")]
    InvalidHex(String),
    #[error("Invalid contract method path: {0}")]
    InvalidMethodPath(String),
    #[error("Contract is not registered in RocketStorage: {0}")]
    ContractNotFound(String),
    #[error("Unexpected call result length: {0}")]
    UnexpectedResultLength(usize),
    #[error("Value does not fit: {0}")]
    Overflow(String),
    #[error("Chart generation error: {0}")]
    ChartGeneration(String),
}
