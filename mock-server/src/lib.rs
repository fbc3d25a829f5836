//! In-memory STRAT node exposing the REST surface the SDK talks to.
//!
//! Every endpoint of the client's catalog is served from a single
//! `RwLock<Node>`. Failures answer with `{"error": "..."}` bodies; axum's
//! own extractor rejections (malformed JSON, bad path params) stay plain
//! text. An optional API key turns on bearer-token checks for all routes.

pub mod node;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub use node::{Node, Rejection, FAUCET_ADDRESS, FAUCET_PRIVATE_KEY};

pub type Db = Arc<RwLock<Node>>;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// When set, every request must carry `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    db: Db,
    config: Arc<AppConfig>,
}

/// JSON error response: `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotFound(m) => ApiError::new(StatusCode::NOT_FOUND, m),
            Rejection::BadRequest(m) => ApiError::new(StatusCode::BAD_REQUEST, m),
            Rejection::Unauthorized(m) => ApiError::new(StatusCode::UNAUTHORIZED, m),
            Rejection::Forbidden(m) => ApiError::new(StatusCode::FORBIDDEN, m),
            Rejection::Conflict(m) => ApiError::new(StatusCode::CONFLICT, m),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn to_json<T: serde::Serialize>(value: T) -> Json<Value> {
    Json(serde_json::to_value(value).unwrap_or(Value::Null))
}

pub fn app() -> Router {
    app_with(AppConfig::default())
}

pub fn app_with(config: AppConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Node::new())),
        config: Arc::new(config),
    };
    Router::new()
        .route("/health", get(health))
        .route("/api", get(api_version))
        // blockchain
        .route("/api/blockchain/info", get(blockchain_info))
        .route("/api/blockchain/blocks", get(latest_blocks))
        .route("/api/blockchain/block-by-index/{index}", get(block_by_index))
        .route("/api/blockchain/block/{hash}", get(block_by_hash))
        // transactions
        .route("/api/transactions/send", post(send_transaction))
        .route("/api/transactions/pending", get(pending_transactions))
        .route("/api/transactions/history/{address}", get(transaction_history))
        .route("/api/transactions/{id}", get(get_transaction))
        // wallets
        .route("/api/auth/register", post(register))
        .route("/api/wallets/balance/{address}", get(balance))
        .route("/api/wallets/utxos/{address}", get(utxos))
        .route("/api/wallets/{address}", get(wallet_info))
        // contracts
        .route("/api/contracts", get(list_contracts))
        .route("/api/contracts/deploy", post(deploy_contract))
        .route("/api/contracts/call", post(call_contract))
        .route("/api/contracts/{address}", get(get_contract))
        .route("/api/contracts/{address}/state", get(contract_state))
        // mining
        .route("/api/mining/info", get(mining_info))
        .route("/api/mining/start", post(start_mining))
        .route("/api/mining/stop", post(stop_mining))
        .route("/api/mining/stats/{address}", get(mining_stats))
        // mempool
        .route("/api/mempool/stats", get(mempool_stats))
        .route("/api/mempool/transactions", get(mempool_transactions))
        // staking
        .route("/api/staking/stake", post(stake))
        .route("/api/staking/unstake", post(unstake))
        .route("/api/staking/claim", post(claim_rewards))
        .route("/api/staking/info/{address}", get(staking_info))
        // nft
        .route("/api/nft/mint", post(mint_nft))
        .route("/api/nft/transfer", post(transfer_nft))
        .route("/api/nft/list/{owner}", get(list_nfts))
        .route("/api/nft/{token_id}", get(get_nft))
        // governance
        .route("/api/governance/proposal", post(create_proposal))
        .route("/api/governance/proposal/{id}", get(get_proposal))
        .route("/api/governance/proposals", get(list_proposals))
        .route("/api/governance/vote", post(vote))
        // explorer
        .route("/api/explorer/address/{address}", get(explorer_address))
        .route("/api/explorer/richlist", get(rich_list))
        .route("/api/explorer/stats", get(network_stats))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, AppConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: AppConfig) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, auth = config.api_key.is_some(), "mock node listening");
    }
    axum::serve(listener, app_with(config)).await
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = &state.config.api_key {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected.as_str()) {
            return ApiError::new(StatusCode::UNAUTHORIZED, "missing or invalid API key")
                .into_response();
        }
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    fn apply<T>(&self, items: Vec<T>, default_limit: usize) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(default_limit))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransaction {
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Register {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployContract {
    pub code: String,
    pub owner: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallContract {
    pub contract_address: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub caller: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMining {
    pub miner_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stake {
    pub address: String,
    pub amount: f64,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub address: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferNft {
    pub token_id: u64,
    pub from: String,
    pub to: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub proposal_id: u64,
    pub vote: bool,
    pub voter: String,
    pub private_key: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn api_version() -> Json<Value> {
    Json(json!({ "name": "STRAT API", "version": env!("CARGO_PKG_VERSION") }))
}

async fn blockchain_info(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({
        "height": node.height(),
        "difficulty": node::DIFFICULTY,
        "latestHash": node.blocks.last().map(|b| b.hash.clone()),
        "pendingTransactions": node.pending.len(),
    }))
}

async fn latest_blocks(State(state): State<AppState>, Query(page): Query<Page>) -> Json<Value> {
    let node = state.db.read().await;
    let blocks: Vec<_> = node.blocks.iter().rev().cloned().collect();
    Json(json!({
        "blocks": page.apply(blocks, 10),
        "total": node.height(),
    }))
}

async fn block_by_index(State(state): State<AppState>, Path(index): Path<u64>) -> ApiResult {
    let node = state.db.read().await;
    node.blocks
        .get(index as usize)
        .map(to_json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("block {index} not found")))
}

async fn block_by_hash(State(state): State<AppState>, Path(hash): Path<String>) -> ApiResult {
    let node = state.db.read().await;
    node.blocks
        .iter()
        .find(|b| b.hash == hash)
        .map(to_json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("block {hash} not found")))
}

async fn get_transaction(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let node = state.db.read().await;
    node.transactions
        .get(&id)
        .map(to_json)
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, format!("transaction {id} not found"))
        })
}

async fn send_transaction(
    State(state): State<AppState>,
    Json(input): Json<SendTransaction>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut node = state.db.write().await;
    let tx = node.send(
        &input.from_address,
        &input.to_address,
        input.amount,
        &input.private_key,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "transaction submitted", "transaction": tx })),
    ))
}

async fn transaction_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(page): Query<Page>,
) -> Json<Value> {
    let node = state.db.read().await;
    let history = node.history(&address);
    let total = history.len();
    Json(json!({
        "address": address,
        "transactions": page.apply(history, 50),
        "total": total,
    }))
}

async fn pending_transactions(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    to_json(node.pending_transactions())
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<Register>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut node = state.db.write().await;
    let wallet = node.register(&input.username, &input.password)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "username": wallet.username,
            "address": wallet.address,
            "privateKey": wallet.private_key,
        })),
    ))
}

async fn balance(State(state): State<AppState>, Path(address): Path<String>) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({ "address": address, "balance": node.balance(&address) }))
}

async fn wallet_info(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let node = state.db.read().await;
    let wallet = node
        .wallets
        .get(&address)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("wallet {address} not found")))?;
    Ok(Json(json!({
        "address": wallet.address,
        "username": wallet.username,
        "balance": node.balance(&address),
        "staked": node.staked(&address),
        "transactionCount": node.history(&address).len(),
    })))
}

/// Received transfers stand in for unspent outputs.
async fn utxos(State(state): State<AppState>, Path(address): Path<String>) -> Json<Value> {
    let node = state.db.read().await;
    let outputs: Vec<Value> = node
        .history(&address)
        .into_iter()
        .filter(|tx| tx.to_address == address)
        .map(|tx| json!({ "txId": tx.id, "outputIndex": 0, "amount": tx.amount }))
        .collect();
    Json(Value::Array(outputs))
}

async fn list_contracts(State(state): State<AppState>, Query(page): Query<Page>) -> Json<Value> {
    let node = state.db.read().await;
    to_json(page.apply(node.contracts.clone(), 50))
}

async fn deploy_contract(
    State(state): State<AppState>,
    Json(input): Json<DeployContract>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut node = state.db.write().await;
    let contract = node.deploy(&input.code, &input.owner, &input.private_key)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "contractAddress": contract.address, "owner": contract.owner })),
    ))
}

async fn call_contract(State(state): State<AppState>, Json(input): Json<CallContract>) -> ApiResult {
    let mut node = state.db.write().await;
    let result = node.call(
        &input.contract_address,
        &input.method,
        &input.params,
        &input.caller,
        &input.private_key,
    )?;
    Ok(Json(json!({ "success": true, "result": result })))
}

async fn get_contract(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let node = state.db.read().await;
    Ok(to_json(node.contract(&address)?))
}

async fn contract_state(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let node = state.db.read().await;
    let contract = node.contract(&address)?;
    Ok(Json(Value::Object(contract.state.clone())))
}

async fn mining_info(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({
        "mining": node.mining.active,
        "minerAddress": node.mining.miner_address,
        "difficulty": node::DIFFICULTY,
        "reward": node::BLOCK_REWARD,
        "height": node.height(),
    }))
}

/// Marks the miner active and seals the pending pool into one block.
async fn start_mining(State(state): State<AppState>, Json(input): Json<StartMining>) -> ApiResult {
    if input.miner_address.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "minerAddress is required"));
    }
    let mut node = state.db.write().await;
    node.mining.active = true;
    node.mining.miner_address = Some(input.miner_address.clone());
    let block = node.mine_block(&input.miner_address);
    Ok(Json(json!({ "message": "mining started", "block": block })))
}

async fn stop_mining(State(state): State<AppState>) -> Json<Value> {
    let mut node = state.db.write().await;
    let was_active = node.mining.active;
    node.mining = Default::default();
    Json(json!({ "message": "mining stopped", "wasActive": was_active }))
}

async fn mining_stats(State(state): State<AppState>, Path(address): Path<String>) -> Json<Value> {
    let node = state.db.read().await;
    let blocks = node.mined_by.get(&address).copied().unwrap_or(0);
    Json(json!({
        "address": address,
        "blocksMined": blocks,
        "totalRewards": blocks as f64 * node::BLOCK_REWARD,
    }))
}

async fn mempool_stats(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    let pending = node.pending_transactions();
    let total: f64 = pending.iter().map(|tx| tx.amount).sum();
    Json(json!({ "size": pending.len(), "totalAmount": total }))
}

async fn mempool_transactions(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    to_json(node.pending_transactions())
}

async fn stake(State(state): State<AppState>, Json(input): Json<Stake>) -> ApiResult {
    let mut node = state.db.write().await;
    let staked = node.stake(&input.address, input.amount, &input.private_key)?;
    Ok(Json(json!({ "address": input.address, "staked": staked })))
}

async fn unstake(State(state): State<AppState>, Json(input): Json<Stake>) -> ApiResult {
    let mut node = state.db.write().await;
    let staked = node.unstake(&input.address, input.amount, &input.private_key)?;
    Ok(Json(json!({ "address": input.address, "staked": staked })))
}

async fn claim_rewards(State(state): State<AppState>, Json(input): Json<Claim>) -> ApiResult {
    let mut node = state.db.write().await;
    let claimed = node.claim(&input.address, &input.private_key)?;
    Ok(Json(json!({ "address": input.address, "claimed": claimed })))
}

async fn staking_info(State(state): State<AppState>, Path(address): Path<String>) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({
        "address": address,
        "staked": node.staked(&address),
        "pendingRewards": node.pending_rewards(&address),
        "rewardRate": node::STAKING_REWARD_RATE,
    }))
}

async fn mint_nft(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut node = state.db.write().await;
    let nft = node.mint(input)?;
    Ok((StatusCode::CREATED, to_json(nft)))
}

async fn get_nft(State(state): State<AppState>, Path(token_id): Path<u64>) -> ApiResult {
    let node = state.db.read().await;
    Ok(to_json(node.nft(token_id)?))
}

async fn transfer_nft(State(state): State<AppState>, Json(input): Json<TransferNft>) -> ApiResult {
    let mut node = state.db.write().await;
    let nft = node.transfer_nft(input.token_id, &input.from, &input.to, &input.private_key)?;
    Ok(to_json(nft))
}

async fn list_nfts(State(state): State<AppState>, Path(owner): Path<String>) -> Json<Value> {
    let node = state.db.read().await;
    let owned: Vec<_> = node.nfts.iter().filter(|n| n.owner == owner).collect();
    to_json(owned)
}

async fn create_proposal(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut node = state.db.write().await;
    let proposal = node.propose(&input)?;
    Ok((StatusCode::CREATED, to_json(proposal)))
}

async fn get_proposal(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult {
    let node = state.db.read().await;
    Ok(to_json(node.proposal(id)?))
}

async fn list_proposals(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Json<Value> {
    let node = state.db.read().await;
    let proposals: Vec<_> = node
        .proposals
        .iter()
        .filter(|p| filter.status.as_deref().is_none_or(|s| p.status == s))
        .collect();
    to_json(proposals)
}

async fn vote(State(state): State<AppState>, Json(input): Json<Vote>) -> ApiResult {
    let mut node = state.db.write().await;
    let proposal = node.vote(input.proposal_id, input.vote, &input.voter, &input.private_key)?;
    Ok(to_json(proposal))
}

async fn explorer_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({
        "address": address,
        "balance": node.balance(&address),
        "staked": node.staked(&address),
        "transactions": node.history(&address),
        "nfts": node.nfts.iter().filter(|n| n.owner == address).count(),
    }))
}

async fn rich_list(State(state): State<AppState>, Query(page): Query<Page>) -> Json<Value> {
    let node = state.db.read().await;
    let entries: Vec<Value> = node
        .rich_list(page.limit.unwrap_or(100))
        .into_iter()
        .enumerate()
        .map(|(i, (address, balance))| json!({ "rank": i + 1, "address": address, "balance": balance }))
        .collect();
    Json(Value::Array(entries))
}

async fn network_stats(State(state): State<AppState>) -> Json<Value> {
    let node = state.db.read().await;
    Json(json!({
        "blocks": node.height(),
        "transactions": node.transactions.len(),
        "addresses": node.balances.len(),
        "contracts": node.contracts.len(),
        "totalSupply": node.total_supply(),
    }))
}
