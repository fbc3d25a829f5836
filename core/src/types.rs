//! Request payloads for the node API.
//!
//! # Design
//! The node expects camelCase field names (`fromAddress`, `privateKey`, ...)
//! that differ from the snake_case parameter names of the client methods.
//! Each POST body gets its own borrowed struct so the renaming lives in one
//! `#[serde]` attribute instead of being repeated in hand-written JSON.
//! Responses are left as untyped `serde_json::Value`; the node's schema is
//! trusted as-is.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction categories understood by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Standard,
    ContractDeploy,
    ContractCall,
    Stake,
    Unstake,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransaction<'a> {
    pub from_address: &'a str,
    pub to_address: &'a str,
    pub amount: f64,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterWallet<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployContract<'a> {
    pub code: &'a str,
    pub owner: &'a str,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallContract<'a> {
    pub contract_address: &'a str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub caller: &'a str,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMining<'a> {
    pub miner_address: &'a str,
}

/// Body shared by stake and unstake.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest<'a> {
    pub address: &'a str,
    pub amount: f64,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRewards<'a> {
    pub address: &'a str,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferNft<'a> {
    pub token_id: u64,
    pub from: &'a str,
    pub to: &'a str,
    pub private_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest<'a> {
    pub proposal_id: u64,
    pub vote: bool,
    pub voter: &'a str,
    pub private_key: &'a str,
}

/// Unsigned transfer description, assembled locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Build a `TransactionDraft` stamped with the current time.
pub fn build_transaction(from: &str, to: &str, amount: f64) -> TransactionDraft {
    TransactionDraft {
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount,
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// One entry of `StratClient::batch_request`.
///
/// For GET, `data` must be a JSON object; its entries become query
/// parameters. For other verbs it is sent as the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub method: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BatchRequest {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
