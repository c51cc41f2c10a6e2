pub mod abi;
mod rpc;

use crate::Result;
use crate::config;
use crate::jsonrpc::abi::Word;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

pub use rpc::StandardRpcClient;

pub fn new_client() -> StandardRpcClient {
    let url = config::get("ETH_RPC_URL").unwrap_or_else(|_| "http://localhost:8545".to_string());
    let retry_limit = config::get("RPC_RETRY_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);
    StandardRpcClient::new(url, retry_limit, Duration::from_secs(30), 0.1)
}

/// ブロックの指定方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Latest,
    Number(u64),
}

impl BlockId {
    pub fn to_param(self) -> String {
        match self {
            BlockId::Latest => "latest".to_string(),
            BlockId::Number(n) => format!("0x{:x}", n),
        }
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockId::Latest => write!(f, "latest"),
            BlockId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<u64> for BlockId {
    fn from(n: u64) -> Self {
        BlockId::Number(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    /// unix 秒
    pub timestamp: i64,
}

pub trait BlockInfo {
    fn get_block(&self, block: BlockId) -> impl Future<Output = Result<BlockHeader>> + Send;
}

/// 生の `eth_call`
pub trait EthCall {
    fn eth_call(
        &self,
        to: &str,
        data: &[u8],
        block: BlockId,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// `"contractName.methodName"` 形式で名前解決して呼び出す
pub trait ContractCall {
    fn call(&self, method: &str, block: BlockId) -> impl Future<Output = Result<Word>> + Send;
}
