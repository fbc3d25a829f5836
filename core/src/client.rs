//! Typed method surface over the STRAT node REST API.
//!
//! # Design
//! Every operation goes through the same three steps: `build_request`
//! produces an `HttpRequest`, the `Transport` executes it, and
//! `parse_response` (or `classify` on transport failure) turns the outcome
//! into a `StratResult<Value>`. `StratClient` holds only immutable
//! connection settings plus the transport; there is no retry, cache or
//! background work. Dropping the client (or calling `close`) releases the
//! transport's connection pool.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::error::{StratError, StratResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError, UreqTransport};
use crate::types::{
    BatchRequest, CallContract, ClaimRewards, DeployContract, RegisterWallet, SendTransaction,
    StakeRequest, StartMining, TransferNft, VoteRequest,
};

pub const DEFAULT_LATEST_BLOCKS: u32 = 10;
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const DEFAULT_RICH_LIST_LIMIT: u32 = 100;

/// Blocking client for one STRAT node.
///
/// Generic over the transport so tests can script responses; the default is
/// a pooled `ureq` agent.
pub struct StratClient<T: Transport = UreqTransport> {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    transport: T,
}

impl<T: Transport> fmt::Debug for StratClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StratClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StratClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Client configured from `STRAT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl Default for StratClient<UreqTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport> StratClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let timeout = config.timeout();
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            timeout,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the connection pool. Consumes the client.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing client");
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Describe a request without executing it.
    ///
    /// The body is dropped for GET/DELETE and the query for anything but GET.
    /// Fails locally if `endpoint` does not start with `/`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> StratResult<HttpRequest> {
        if !endpoint.starts_with('/') {
            return Err(StratError::Generic(format!(
                "endpoint must start with '/': {endpoint}"
            )));
        }

        let mut headers = Vec::new();
        let body = match body {
            Some(value) if method.carries_body() => {
                let encoded = serde_json::to_string(value)
                    .map_err(|e| StratError::Generic(format!("failed to encode body: {e}")))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            _ => None,
        };
        if let Some(key) = &self.api_key {
            headers.push(("authorization".to_string(), format!("Bearer {key}")));
        }

        let query = if method == HttpMethod::Get {
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect()
        } else {
            Vec::new()
        };

        Ok(HttpRequest {
            method,
            url: format!("{}{endpoint}", self.base_url),
            headers,
            query,
            body,
        })
    }

    /// Execute one request and return the parsed JSON response.
    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> StratResult<Value> {
        let request = self.build_request(method, endpoint, body, query)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let result = match self.transport.execute(&request) {
            Ok(response) => self.parse_response(response),
            Err(err) => Err(self.classify(err)),
        };
        if let Err(err) = &result {
            warn!(method = %request.method, url = %request.url, error = %err, "request failed");
        }
        result
    }

    /// Like `request`, with the verb given as text.
    ///
    /// An unknown verb fails before any I/O. `data` becomes the query string
    /// for GET (it must then be a JSON object) and the body otherwise.
    pub fn request_raw(
        &self,
        method: &str,
        endpoint: &str,
        data: Option<&Value>,
    ) -> StratResult<Value> {
        let method: HttpMethod = method.parse()?;
        if method != HttpMethod::Get {
            return self.request(method, endpoint, data, &[]);
        }

        let pairs = match data {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.as_str(), query_value(v)))
                .collect(),
            Some(other) => {
                return Err(StratError::Generic(format!(
                    "query parameters must be a JSON object, got {other}"
                )))
            }
        };
        self.request(method, endpoint, None, &pairs)
    }

    /// Classify a response the transport did receive.
    pub fn parse_response(&self, response: HttpResponse) -> StratResult<Value> {
        if !response.is_success() {
            return Err(StratError::Api {
                status: response.status,
                message: api_error_message(&response.body),
            });
        }
        // 204 and other bodiless successes carry no JSON
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body)
            .map_err(|e| StratError::Generic(format!("malformed response body: {e}")))
    }

    /// Classify a failure to get any response.
    fn classify(&self, err: TransportError) -> StratError {
        match err {
            TransportError::Timeout => StratError::Network {
                message: format!(
                    "request timeout after {} seconds",
                    self.timeout.as_secs_f64()
                ),
            },
            TransportError::Connect(detail) => StratError::Network {
                message: format!("could not connect to {}: {detail}", self.base_url),
            },
            TransportError::Other(detail) => StratError::Generic(detail),
        }
    }

    fn get(&self, endpoint: &str) -> StratResult<Value> {
        self.request(HttpMethod::Get, endpoint, None, &[])
    }

    fn get_with_query(&self, endpoint: &str, query: &[(&str, String)]) -> StratResult<Value> {
        self.request(HttpMethod::Get, endpoint, None, query)
    }

    fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> StratResult<Value> {
        let body = serde_json::to_value(body)
            .map_err(|e| StratError::Generic(format!("failed to encode body: {e}")))?;
        self.request(HttpMethod::Post, endpoint, Some(&body), &[])
    }

    // -----------------------------------------------------------------------
    // Blockchain
    // -----------------------------------------------------------------------

    pub fn get_blockchain_info(&self) -> StratResult<Value> {
        self.get("/api/blockchain/info")
    }

    /// Look up a block by index or hash.
    ///
    /// An identifier made only of ASCII digits is treated as an index;
    /// anything else is passed through as a hash without validation.
    pub fn get_block(&self, identifier: &str) -> StratResult<Value> {
        if is_block_index(identifier) {
            self.get(&format!("/api/blockchain/block-by-index/{identifier}"))
        } else {
            self.get(&format!("/api/blockchain/block/{identifier}"))
        }
    }

    pub fn get_block_by_index(&self, index: u64) -> StratResult<Value> {
        self.get(&format!("/api/blockchain/block-by-index/{index}"))
    }

    pub fn get_block_by_hash(&self, hash: &str) -> StratResult<Value> {
        self.get(&format!("/api/blockchain/block/{hash}"))
    }

    pub fn get_latest_blocks(&self, limit: u32) -> StratResult<Value> {
        self.get_with_query("/api/blockchain/blocks", &[("limit", limit.to_string())])
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    pub fn get_transaction(&self, tx_id: &str) -> StratResult<Value> {
        self.get(&format!("/api/transactions/{tx_id}"))
    }

    pub fn send_transaction(
        &self,
        from_address: &str,
        to_address: &str,
        amount: f64,
        private_key: &str,
    ) -> StratResult<Value> {
        self.post(
            "/api/transactions/send",
            &SendTransaction {
                from_address,
                to_address,
                amount,
                private_key,
            },
        )
    }

    pub fn get_transaction_history(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> StratResult<Value> {
        self.get_with_query(
            &format!("/api/transactions/history/{address}"),
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
    }

    pub fn get_pending_transactions(&self) -> StratResult<Value> {
        self.get("/api/transactions/pending")
    }

    // -----------------------------------------------------------------------
    // Wallets
    // -----------------------------------------------------------------------

    /// Register an account; the node generates the address and keys.
    pub fn create_wallet(&self, username: &str, password: &str) -> StratResult<Value> {
        self.post("/api/auth/register", &RegisterWallet { username, password })
    }

    /// Balance of `address`, projected from the response's `balance` field.
    pub fn get_balance(&self, address: &str) -> StratResult<f64> {
        let response = self.get(&format!("/api/wallets/balance/{address}"))?;
        response
            .get("balance")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                StratError::Generic("response has no numeric `balance` field".to_string())
            })
    }

    pub fn get_wallet_info(&self, address: &str) -> StratResult<Value> {
        self.get(&format!("/api/wallets/{address}"))
    }

    pub fn get_utxos(&self, address: &str) -> StratResult<Value> {
        self.get(&format!("/api/wallets/utxos/{address}"))
    }

    // -----------------------------------------------------------------------
    // Contracts
    // -----------------------------------------------------------------------

    pub fn deploy_contract(&self, code: &str, owner: &str, private_key: &str) -> StratResult<Value> {
        self.post(
            "/api/contracts/deploy",
            &DeployContract {
                code,
                owner,
                private_key,
            },
        )
    }

    pub fn call_contract(
        &self,
        contract_address: &str,
        method: &str,
        params: &[Value],
        caller: &str,
        private_key: &str,
    ) -> StratResult<Value> {
        self.post(
            "/api/contracts/call",
            &CallContract {
                contract_address,
                method,
                params,
                caller,
                private_key,
            },
        )
    }

    pub fn get_contract(&self, contract_address: &str) -> StratResult<Value> {
        self.get(&format!("/api/contracts/{contract_address}"))
    }

    pub fn get_contract_state(&self, contract_address: &str) -> StratResult<Value> {
        self.get(&format!("/api/contracts/{contract_address}/state"))
    }

    pub fn list_contracts(&self, limit: u32, offset: u32) -> StratResult<Value> {
        self.get_with_query(
            "/api/contracts",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
    }

    // -----------------------------------------------------------------------
    // Mining
    // -----------------------------------------------------------------------

    pub fn get_mining_info(&self) -> StratResult<Value> {
        self.get("/api/mining/info")
    }

    pub fn start_mining(&self, miner_address: &str) -> StratResult<Value> {
        self.post("/api/mining/start", &StartMining { miner_address })
    }

    pub fn stop_mining(&self) -> StratResult<Value> {
        self.request(HttpMethod::Post, "/api/mining/stop", None, &[])
    }

    pub fn get_mining_stats(&self, address: &str) -> StratResult<Value> {
        self.get(&format!("/api/mining/stats/{address}"))
    }

    // -----------------------------------------------------------------------
    // Mempool
    // -----------------------------------------------------------------------

    pub fn get_mempool_info(&self) -> StratResult<Value> {
        self.get("/api/mempool/stats")
    }

    pub fn get_mempool_transactions(&self) -> StratResult<Value> {
        self.get("/api/mempool/transactions")
    }

    // -----------------------------------------------------------------------
    // Staking
    // -----------------------------------------------------------------------

    pub fn stake(&self, address: &str, amount: f64, private_key: &str) -> StratResult<Value> {
        self.post(
            "/api/staking/stake",
            &StakeRequest {
                address,
                amount,
                private_key,
            },
        )
    }

    pub fn unstake(&self, address: &str, amount: f64, private_key: &str) -> StratResult<Value> {
        self.post(
            "/api/staking/unstake",
            &StakeRequest {
                address,
                amount,
                private_key,
            },
        )
    }

    pub fn get_staking_info(&self, address: &str) -> StratResult<Value> {
        self.get(&format!("/api/staking/info/{address}"))
    }

    pub fn claim_rewards(&self, address: &str, private_key: &str) -> StratResult<Value> {
        self.post(
            "/api/staking/claim",
            &ClaimRewards {
                address,
                private_key,
            },
        )
    }

    // -----------------------------------------------------------------------
    // NFTs
    // -----------------------------------------------------------------------

    /// Mint with a caller-supplied metadata object, sent as-is.
    pub fn mint_nft(&self, data: &Value) -> StratResult<Value> {
        self.request(HttpMethod::Post, "/api/nft/mint", Some(data), &[])
    }

    pub fn get_nft(&self, token_id: u64) -> StratResult<Value> {
        self.get(&format!("/api/nft/{token_id}"))
    }

    pub fn transfer_nft(
        &self,
        token_id: u64,
        from: &str,
        to: &str,
        private_key: &str,
    ) -> StratResult<Value> {
        self.post(
            "/api/nft/transfer",
            &TransferNft {
                token_id,
                from,
                to,
                private_key,
            },
        )
    }

    pub fn list_nfts(&self, owner: &str) -> StratResult<Value> {
        self.get(&format!("/api/nft/list/{owner}"))
    }

    // -----------------------------------------------------------------------
    // Governance
    // -----------------------------------------------------------------------

    pub fn create_proposal(&self, data: &Value) -> StratResult<Value> {
        self.request(HttpMethod::Post, "/api/governance/proposal", Some(data), &[])
    }

    pub fn vote(
        &self,
        proposal_id: u64,
        vote: bool,
        voter: &str,
        private_key: &str,
    ) -> StratResult<Value> {
        self.post(
            "/api/governance/vote",
            &VoteRequest {
                proposal_id,
                vote,
                voter,
                private_key,
            },
        )
    }

    pub fn get_proposal(&self, proposal_id: u64) -> StratResult<Value> {
        self.get(&format!("/api/governance/proposal/{proposal_id}"))
    }

    /// List proposals, optionally filtered by status.
    ///
    /// `None` or an empty status sends no `status` parameter at all.
    pub fn list_proposals(&self, status: Option<&str>) -> StratResult<Value> {
        match status.filter(|s| !s.is_empty()) {
            Some(status) => self.get_with_query(
                "/api/governance/proposals",
                &[("status", status.to_string())],
            ),
            None => self.get("/api/governance/proposals"),
        }
    }

    // -----------------------------------------------------------------------
    // Explorer
    // -----------------------------------------------------------------------

    pub fn search_address(&self, address: &str) -> StratResult<Value> {
        self.get(&format!("/api/explorer/address/{address}"))
    }

    pub fn get_rich_list(&self, limit: u32) -> StratResult<Value> {
        self.get_with_query("/api/explorer/richlist", &[("limit", limit.to_string())])
    }

    pub fn get_network_stats(&self) -> StratResult<Value> {
        self.get("/api/explorer/stats")
    }

    // -----------------------------------------------------------------------
    // Utility
    // -----------------------------------------------------------------------

    pub fn health_check(&self) -> StratResult<Value> {
        self.get("/health")
    }

    pub fn get_api_version(&self) -> StratResult<Value> {
        self.get("/api")
    }

    /// Run each request in order and collect every outcome.
    ///
    /// A failed entry does not stop the ones after it.
    pub fn batch_request(&self, requests: &[BatchRequest]) -> Vec<StratResult<Value>> {
        requests
            .iter()
            .map(|req| self.request_raw(&req.method, &req.endpoint, req.data.as_ref()))
            .collect()
    }
}

fn is_block_index(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

/// Render a JSON value as a query-string value: strings unquoted.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Message for a non-2xx response: the body's string `error` field when the
/// body is a JSON object carrying one, else the raw body text.
fn api_error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        match map.get("error") {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    if body.trim().is_empty() {
        "empty response body".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    /// Replays queued outcomes and records every request it was given.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn respond(self, status: u16, body: &str) -> Self {
            self.outcomes
                .borrow_mut()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        fn fail(self, err: TransportError) -> Self {
            self.outcomes.borrow_mut().push_back(Err(err));
            self
        }

        fn last(&self) -> HttpRequest {
            self.seen.borrow().last().cloned().expect("no request recorded")
        }

        fn count(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        }
    }

    const BASE: &str = "http://localhost:3000";
    const ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn client(transport: ScriptedTransport) -> StratClient<ScriptedTransport> {
        StratClient::with_transport(ClientConfig::default(), transport)
    }

    fn ok_client() -> StratClient<ScriptedTransport> {
        client(ScriptedTransport::default())
    }

    fn body_of(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().expect("request has a body")).unwrap()
    }

    fn query_of(req: &HttpRequest) -> Vec<(&str, &str)> {
        req.query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    // --- request building ---

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::default().with_api_url("http://localhost:3000///");
        let c = StratClient::with_transport(config, ScriptedTransport::default());
        assert_eq!(c.base_url(), BASE);
        c.health_check().unwrap();
        assert_eq!(c.transport().last().url, "http://localhost:3000/health");
    }

    #[test]
    fn bearer_header_attached_when_key_configured() {
        let config = ClientConfig::default().with_api_key("k123");
        let c = StratClient::with_transport(config, ScriptedTransport::default());
        c.get_blockchain_info().unwrap();
        assert_eq!(c.transport().last().header("authorization"), Some("Bearer k123"));
    }

    #[test]
    fn no_auth_header_without_key() {
        let c = ok_client();
        c.get_blockchain_info().unwrap();
        let req = c.transport().last();
        assert!(req.header("authorization").is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_request_drops_body_on_get_and_query_on_post() {
        let c = ok_client();
        let body = json!({"a": 1});
        let get = c
            .build_request(HttpMethod::Get, "/x", Some(&body), &[("q", "1".to_string())])
            .unwrap();
        assert!(get.body.is_none());
        assert_eq!(query_of(&get), vec![("q", "1")]);

        let post = c
            .build_request(HttpMethod::Post, "/x", Some(&body), &[("q", "1".to_string())])
            .unwrap();
        assert!(post.query.is_empty());
        assert_eq!(post.header("content-type"), Some("application/json"));
        assert_eq!(body_of(&post), body);
    }

    #[test]
    fn endpoint_without_leading_slash_fails_locally() {
        let c = ok_client();
        let err = c.request(HttpMethod::Get, "health", None, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(c.transport().count(), 0);
    }

    #[test]
    fn unsupported_method_fails_without_io() {
        let c = ok_client();
        let err = c.request_raw("PATCH", "/health", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert!(err.to_string().contains("PATCH"));
        assert_eq!(c.transport().count(), 0);
    }

    // --- branching methods ---

    #[test]
    fn digit_identifier_uses_index_endpoint() {
        let c = ok_client();
        c.get_block("42").unwrap();
        assert_eq!(
            c.transport().last().url,
            format!("{BASE}/api/blockchain/block-by-index/42")
        );
    }

    #[test]
    fn non_digit_identifier_uses_hash_endpoint() {
        let c = ok_client();
        c.get_block("0xabc123").unwrap();
        assert_eq!(c.transport().last().url, format!("{BASE}/api/blockchain/block/0xabc123"));

        c.get_block("-1").unwrap();
        assert_eq!(c.transport().last().url, format!("{BASE}/api/blockchain/block/-1"));

        c.get_block("").unwrap();
        assert_eq!(c.transport().last().url, format!("{BASE}/api/blockchain/block/"));
    }

    #[test]
    fn list_proposals_without_status_sends_no_parameter() {
        let c = ok_client();
        c.list_proposals(None).unwrap();
        let req = c.transport().last();
        assert_eq!(req.url, format!("{BASE}/api/governance/proposals"));
        assert!(req.query.is_empty());

        c.list_proposals(Some("")).unwrap();
        assert!(c.transport().last().query.is_empty());
    }

    #[test]
    fn list_proposals_with_status_sends_it() {
        let c = ok_client();
        c.list_proposals(Some("active")).unwrap();
        assert_eq!(query_of(&c.transport().last()), vec![("status", "active")]);
    }

    // --- fixed mappings ---

    #[test]
    fn send_transaction_uses_external_field_names() {
        let c = ok_client();
        c.send_transaction(ADDR, "0xdead", 2.5, "pk").unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE}/api/transactions/send"));
        assert_eq!(
            body_of(&req),
            json!({"fromAddress": ADDR, "toAddress": "0xdead", "amount": 2.5, "privateKey": "pk"})
        );
    }

    #[test]
    fn history_carries_limit_and_offset() {
        let c = ok_client();
        c.get_transaction_history(ADDR, 20, 40).unwrap();
        let req = c.transport().last();
        assert_eq!(req.url, format!("{BASE}/api/transactions/history/{ADDR}"));
        assert_eq!(query_of(&req), vec![("limit", "20"), ("offset", "40")]);
    }

    #[test]
    fn call_contract_body() {
        let c = ok_client();
        c.call_contract("0xc0", "transfer", &[json!("0xb"), json!(5)], ADDR, "pk")
            .unwrap();
        assert_eq!(
            body_of(&c.transport().last()),
            json!({
                "contractAddress": "0xc0",
                "method": "transfer",
                "params": ["0xb", 5],
                "caller": ADDR,
                "privateKey": "pk"
            })
        );
    }

    #[test]
    fn stop_mining_posts_without_body() {
        let c = ok_client();
        c.stop_mining().unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE}/api/mining/stop"));
        assert!(req.body.is_none());
    }

    #[test]
    fn vote_and_transfer_nft_bodies() {
        let c = ok_client();
        c.vote(3, true, ADDR, "pk").unwrap();
        assert_eq!(
            body_of(&c.transport().last()),
            json!({"proposalId": 3, "vote": true, "voter": ADDR, "privateKey": "pk"})
        );

        c.transfer_nft(9, "0xa", "0xb", "pk").unwrap();
        let req = c.transport().last();
        assert_eq!(req.url, format!("{BASE}/api/nft/transfer"));
        assert_eq!(
            body_of(&req),
            json!({"tokenId": 9, "from": "0xa", "to": "0xb", "privateKey": "pk"})
        );
    }

    #[test]
    fn mint_nft_sends_caller_object_verbatim() {
        let c = ok_client();
        let data = json!({"name": "Sword", "owner": ADDR, "attributes": {"rarity": "epic"}});
        c.mint_nft(&data).unwrap();
        assert_eq!(body_of(&c.transport().last()), data);
    }

    #[test]
    fn simple_paths() {
        let c = ok_client();
        let expect_get = |path: &str| {
            let req = c.transport().last();
            assert_eq!(req.method, HttpMethod::Get, "{path}");
            assert_eq!(req.url, format!("{BASE}{path}"));
        };

        c.get_pending_transactions().unwrap();
        expect_get("/api/transactions/pending");
        c.get_utxos(ADDR).unwrap();
        expect_get(&format!("/api/wallets/utxos/{ADDR}"));
        c.get_wallet_info(ADDR).unwrap();
        expect_get(&format!("/api/wallets/{ADDR}"));
        c.get_contract_state("0xc0").unwrap();
        expect_get("/api/contracts/0xc0/state");
        c.get_mempool_info().unwrap();
        expect_get("/api/mempool/stats");
        c.get_mempool_transactions().unwrap();
        expect_get("/api/mempool/transactions");
        c.get_staking_info(ADDR).unwrap();
        expect_get(&format!("/api/staking/info/{ADDR}"));
        c.get_nft(12).unwrap();
        expect_get("/api/nft/12");
        c.list_nfts(ADDR).unwrap();
        expect_get(&format!("/api/nft/list/{ADDR}"));
        c.get_proposal(4).unwrap();
        expect_get("/api/governance/proposal/4");
        c.search_address(ADDR).unwrap();
        expect_get(&format!("/api/explorer/address/{ADDR}"));
        c.get_network_stats().unwrap();
        expect_get("/api/explorer/stats");
        c.get_api_version().unwrap();
        expect_get("/api");
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = ClientConfig::default().with_api_key("hunter2");
        let c = StratClient::with_transport(config, ScriptedTransport::default());
        let rendered = format!("{c:?}");
        assert!(!rendered.contains("hunter2"));
    }

    // --- projection ---

    #[test]
    fn get_balance_returns_only_the_balance_field() {
        let c = client(
            ScriptedTransport::default().respond(200, r#"{"address":"0xabc","balance":12.75}"#),
        );
        let balance = c.get_balance("0xabc").unwrap();
        assert_eq!(balance, 12.75);
        assert_eq!(c.transport().last().url, format!("{BASE}/api/wallets/balance/0xabc"));
    }

    #[test]
    fn get_balance_without_numeric_field_is_generic() {
        let c = client(ScriptedTransport::default().respond(200, r#"{"balance":"lots"}"#));
        let err = c.get_balance("0xabc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
    }

    // --- classification ---

    #[test]
    fn json_error_body_becomes_api_error() {
        let c = client(ScriptedTransport::default().respond(404, r#"{"error":"not found"}"#));
        let err = c.get_transaction("abc").unwrap_err();
        assert!(matches!(&err, StratError::Api { status: 404, message } if message == "not found"));
        let text = err.to_string();
        assert!(text.contains("404") && text.contains("not found"));
    }

    #[test]
    fn non_json_error_body_is_used_raw() {
        let c = client(ScriptedTransport::default().respond(500, "Internal Server Error: db down"));
        let err = c.get_blockchain_info().unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("Internal Server Error: db down"));
    }

    #[test]
    fn json_error_body_without_error_field_is_used_raw() {
        let c = client(ScriptedTransport::default().respond(400, r#"{"message":"bad"}"#));
        let err = c.get_blockchain_info().unwrap_err();
        assert!(err.to_string().contains(r#"{"message":"bad"}"#));
    }

    #[test]
    fn timeout_mentions_configured_timeout() {
        let config = ClientConfig::default().with_timeout_secs(7);
        let c = StratClient::with_transport(
            config,
            ScriptedTransport::default().fail(TransportError::Timeout),
        );
        let err = c.health_check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("7 seconds"), "{err}");
    }

    #[test]
    fn connection_failure_mentions_base_url() {
        let c = client(
            ScriptedTransport::default().fail(TransportError::Connect("refused".to_string())),
        );
        let err = c.health_check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains(BASE), "{err}");
    }

    #[test]
    fn other_transport_failure_is_generic_with_cause() {
        let c = client(
            ScriptedTransport::default().fail(TransportError::Other("tls handshake".to_string())),
        );
        let err = c.health_check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert!(err.to_string().contains("tls handshake"));
    }

    #[test]
    fn malformed_success_body_is_generic() {
        let c = client(ScriptedTransport::default().respond(200, "<html>"));
        let err = c.get_blockchain_info().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
    }

    #[test]
    fn scalar_and_empty_bodies_pass_through() {
        let c = client(ScriptedTransport::default().respond(200, "42").respond(204, ""));
        assert_eq!(c.get_blockchain_info().unwrap(), json!(42));
        assert_eq!(c.get_blockchain_info().unwrap(), Value::Null);
    }

    // --- batch ---

    #[test]
    fn batch_runs_every_entry_in_order() {
        let c = client(
            ScriptedTransport::default()
                .respond(200, r#"{"status":"ok"}"#)
                .respond(404, r#"{"error":"missing"}"#)
                .respond(200, r#"{"txId":"t1"}"#),
        );
        let requests = vec![
            BatchRequest::new("GET", "/health"),
            BatchRequest::new("GET", "/api/transactions/nope"),
            BatchRequest::new("PATCH", "/ignored"),
            BatchRequest::new("POST", "/api/transactions/send")
                .with_data(json!({"fromAddress": "0xa"})),
        ];
        let results = c.batch_request(&requests);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap()["status"], "ok");
        assert_eq!(results[1].as_ref().unwrap_err().status(), Some(404));
        assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::Generic);
        assert_eq!(results[3].as_ref().unwrap()["txId"], "t1");
        // the PATCH entry never reached the transport
        assert_eq!(c.transport().count(), 3);
    }

    #[test]
    fn batch_get_data_becomes_query() {
        let c = ok_client();
        let results = c.batch_request(&[BatchRequest::new("get", "/api/explorer/richlist")
            .with_data(json!({"limit": 5, "sort": "desc"}))]);
        assert!(results[0].is_ok());
        let req = c.transport().last();
        assert!(req.body.is_none());
        let mut query = query_of(&req);
        query.sort();
        assert_eq!(query, vec![("limit", "5"), ("sort", "desc")]);
    }

    #[test]
    fn batch_get_with_non_object_data_fails_locally() {
        let c = ok_client();
        let results =
            c.batch_request(&[BatchRequest::new("GET", "/health").with_data(json!([1, 2]))]);
        assert_eq!(results[0].as_ref().unwrap_err().kind(), ErrorKind::Generic);
        assert_eq!(c.transport().count(), 0);
    }
}
