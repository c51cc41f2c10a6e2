pub mod solidity;

use crate::Result;
use crate::config;
use crate::errors::Error;
use crate::jsonrpc::abi::{self, Word};
use crate::jsonrpc::{BlockHeader, BlockId, BlockInfo, ContractCall, EthCall};
use crate::logging::*;
use std::collections::HashMap;
use tokio::sync::RwLock;


pub const ROCKET_STORAGE_DEFAULT: &str = "0x1d8f8f00cfa6758d7bE78336684788Fb0ee0Fa46";

/// RocketStorage 経由でコントラクトアドレスを解決するクライアント
///
/// 解決済みのアドレスはプロセスの寿命の間キャッシュする。
pub struct RocketPool<C> {
    client: C,
    storage_address: String,
    addresses: RwLock<HashMap<String, String>>,
}

impl<C> RocketPool<C> {
    pub fn new(client: C, storage_address: String) -> Self {
        Self {
            client,
            storage_address,
            addresses: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(client: C) -> Self {
        let storage_address = config::get("ROCKET_STORAGE_ADDRESS")
            .unwrap_or_else(|_| ROCKET_STORAGE_DEFAULT.to_string());
        Self::new(client, storage_address)
    }
}

/// `keccak256("contract.address" ++ name)`
pub fn storage_key(name: &str) -> [u8; 32] {
    let mut data = b"contract.address".to_vec();
    data.extend_from_slice(name.as_bytes());
    abi::keccak256(&data)
}

/// `"rocketTokenRETH.getExchangeRate"` を `("rocketTokenRETH", "getExchangeRate")` に分ける
pub fn split_method(method: &str) -> Result<(&str, &str)> {
    match method.split_once('.') {
        Some((contract, function)) if !contract.is_empty() && !function.is_empty() => {
            Ok((contract, function))
        }
        _ => Err(Error::InvalidMethodPath(method.to_string()).into()),
    }
}

impl<C> RocketPool<C>
where
    C: EthCall + Send + Sync,
{
    pub async fn address_of(&self, name: &str) -> Result<String> {
        if let Some(address) = self.addresses.read().await.get(name) {
            return Ok(address.clone());
        }

        let log = DEFAULT.new(o!(
            "function" => "RocketPool::address_of",
            "contract" => name.to_owned(),
        ));

        let data = abi::encode_call_bytes32("getAddress(bytes32)", &storage_key(name));
        let output = self
            .client
            .eth_call(&self.storage_address, &data, BlockId::Latest)
            .await?;
        let word = Word::from_output(&output)?;
        if word.is_zero() {
            return Err(Error::ContractNotFound(name.to_string()).into());
        }
        let address = word.as_address();
        debug!(log, "resolved"; "address" => &address);

        self.addresses
            .write()
            .await
            .insert(name.to_string(), address.clone());
        Ok(address)
    }
}

impl<C> ContractCall for RocketPool<C>
where
    C: EthCall + Send + Sync,
{
    async fn call(&self, method: &str, block: BlockId) -> Result<Word> {
        let (contract, function) = split_method(method)?;
        let address = self.address_of(contract).await?;
        let data = abi::encode_call(&format!("{}()", function));
        let output = self.client.eth_call(&address, &data, block).await?;
        Word::from_output(&output)
    }
}

impl<C> BlockInfo for RocketPool<C>
where
    C: BlockInfo + Send + Sync,
{
    async fn get_block(&self, block: BlockId) -> Result<BlockHeader> {
        self.client.get_block(block).await
    }
}

/// 最後に残高スナップショットが記録されたブロック
pub async fn balances_block<C: ContractCall>(client: &C, at: BlockId) -> Result<u64> {
    client
        .call("rocketNetworkBalances.getBalancesBlock", at)
        .await?
        .as_u64()
}

/// rETH/ETH の交換レート
pub async fn reth_exchange_rate<C: ContractCall>(client: &C, at: BlockId) -> Result<f64> {
    let word = client.call("rocketTokenRETH.getExchangeRate", at).await?;
    solidity::to_float(&word.as_int(), 18)
}

/// ノード需要 (ETH, 符号付き)
pub async fn node_demand<C: ContractCall>(client: &C) -> Result<f64> {
    let word = client
        .call("rocketNetworkFees.getNodeDemand", BlockId::Latest)
        .await?;
    solidity::to_float(&word.as_int(), 18)
}

/// 現在のコミッション (%)
pub async fn node_fee<C: ContractCall>(client: &C) -> Result<f64> {
    percent(client, "rocketNetworkFees.getNodeFee").await
}

pub async fn minimum_node_fee<C: ContractCall>(client: &C) -> Result<f64> {
    percent(client, "rocketDAOProtocolSettingsNetwork.getMinimumNodeFee").await
}

pub async fn maximum_node_fee<C: ContractCall>(client: &C) -> Result<f64> {
    percent(client, "rocketDAOProtocolSettingsNetwork.getMaximumNodeFee").await
}

pub async fn target_node_fee<C: ContractCall>(client: &C) -> Result<f64> {
    percent(client, "rocketDAOProtocolSettingsNetwork.getTargetNodeFee").await
}

/// 需要レンジ (ETH)
pub async fn node_fee_demand_range<C: ContractCall>(client: &C) -> Result<f64> {
    let word = client
        .call(
            "rocketDAOProtocolSettingsNetwork.getNodeFeeDemandRange",
            BlockId::Latest,
        )
        .await?;
    solidity::to_float(&word.as_int(), 18)
}

// 1e18 = 100% なので 16 桁で % になる
async fn percent<C: ContractCall>(client: &C, method: &str) -> Result<f64> {
    let word = client.call(method, BlockId::Latest).await?;
    solidity::to_float(&word.as_int(), 16)
}
