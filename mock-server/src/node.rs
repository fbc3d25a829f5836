//! In-memory ledger backing the mock node.
//!
//! Nothing here is real consensus: balances move as soon as a transaction
//! is accepted, and "mining" seals whatever is pending into one block.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const FAUCET_ADDRESS: &str = "0x000000000000000000000000000000000000fa11";
pub const FAUCET_PRIVATE_KEY: &str = "faucet-private-key";
pub const FAUCET_SUPPLY: f64 = 1_000_000.0;
pub const BLOCK_REWARD: f64 = 50.0;
pub const DIFFICULTY: u32 = 4;
pub const STAKING_REWARD_RATE: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: i64,
    pub transactions: Vec<String>,
    pub miner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    pub timestamp: i64,
    pub status: String,
    pub block_index: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Wallet {
    pub username: String,
    pub address: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub address: String,
    pub owner: String,
    pub code: String,
    pub state: Map<String, Value>,
    pub deployed_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub token_id: u64,
    pub owner: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub proposer: Option<String>,
    pub status: String,
    pub votes_for: u64,
    pub votes_against: u64,
    #[serde(skip)]
    pub voters: HashSet<String>,
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningState {
    pub active: bool,
    pub miner_address: Option<String>,
}

/// Reasons a ledger operation is refused. Mapped to HTTP statuses by the
/// router.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

pub type Outcome<T> = Result<T, Rejection>;

#[derive(Debug)]
pub struct Node {
    pub blocks: Vec<Block>,
    pub transactions: HashMap<String, Transaction>,
    pub pending: Vec<String>,
    pub balances: HashMap<String, f64>,
    pub wallets: HashMap<String, Wallet>,
    pub contracts: Vec<Contract>,
    pub mining: MiningState,
    pub mined_by: HashMap<String, u64>,
    pub stakes: HashMap<String, f64>,
    pub nfts: Vec<Nft>,
    pub proposals: Vec<Proposal>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

pub fn random_hash() -> String {
    format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn random_address() -> String {
    let hex = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    format!("0x{}", &hex[..40])
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl Node {
    /// Genesis block plus a funded faucet wallet.
    pub fn new() -> Self {
        let genesis = Block {
            index: 0,
            hash: random_hash(),
            previous_hash: "0".to_string(),
            timestamp: now_millis(),
            transactions: Vec::new(),
            miner: None,
        };
        let mut node = Self {
            blocks: vec![genesis],
            transactions: HashMap::new(),
            pending: Vec::new(),
            balances: HashMap::new(),
            wallets: HashMap::new(),
            contracts: Vec::new(),
            mining: MiningState::default(),
            mined_by: HashMap::new(),
            stakes: HashMap::new(),
            nfts: Vec::new(),
            proposals: Vec::new(),
        };
        node.balances.insert(FAUCET_ADDRESS.to_string(), FAUCET_SUPPLY);
        node.wallets.insert(
            FAUCET_ADDRESS.to_string(),
            Wallet {
                username: "faucet".to_string(),
                address: FAUCET_ADDRESS.to_string(),
                private_key: FAUCET_PRIVATE_KEY.to_string(),
            },
        );
        node
    }

    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn balance(&self, address: &str) -> f64 {
        self.balances.get(address).copied().unwrap_or(0.0)
    }

    pub fn staked(&self, address: &str) -> f64 {
        self.stakes.get(address).copied().unwrap_or(0.0)
    }

    fn authorize(&self, address: &str, private_key: &str) -> Outcome<()> {
        match self.wallets.get(address) {
            Some(wallet) if wallet.private_key == private_key => Ok(()),
            Some(_) => Err(Rejection::Unauthorized("invalid private key".to_string())),
            None => Err(Rejection::NotFound(format!("wallet {address} not found"))),
        }
    }

    fn debit(&mut self, address: &str, amount: f64) -> Outcome<()> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(Rejection::BadRequest("amount must be positive".to_string()));
        }
        let balance = self.balance(address);
        if balance < amount {
            return Err(Rejection::BadRequest("insufficient balance".to_string()));
        }
        self.balances.insert(address.to_string(), balance - amount);
        Ok(())
    }

    fn credit(&mut self, address: &str, amount: f64) {
        *self.balances.entry(address.to_string()).or_insert(0.0) += amount;
    }

    pub fn register(&mut self, username: &str, password: &str) -> Outcome<Wallet> {
        if username.is_empty() || password.is_empty() {
            return Err(Rejection::BadRequest(
                "username and password are required".to_string(),
            ));
        }
        if self.wallets.values().any(|w| w.username == username) {
            return Err(Rejection::Conflict(format!("username {username} already exists")));
        }
        let wallet = Wallet {
            username: username.to_string(),
            address: random_address(),
            private_key: Uuid::new_v4().simple().to_string(),
        };
        self.wallets.insert(wallet.address.clone(), wallet.clone());
        Ok(wallet)
    }

    pub fn send(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
        private_key: &str,
    ) -> Outcome<Transaction> {
        self.authorize(from, private_key)?;
        self.debit(from, amount)?;
        self.credit(to, amount);

        let tx = Transaction {
            id: random_hash(),
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount,
            timestamp: now_millis(),
            status: "pending".to_string(),
            block_index: None,
        };
        self.pending.push(tx.id.clone());
        self.transactions.insert(tx.id.clone(), tx.clone());
        Ok(tx)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pending
            .iter()
            .filter_map(|id| self.transactions.get(id).cloned())
            .collect()
    }

    /// Transactions touching `address`, newest first.
    pub fn history(&self, address: &str) -> Vec<Transaction> {
        let mut txs: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.from_address == address || tx.to_address == address)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        txs
    }

    /// Seal every pending transaction into a new block and pay the miner.
    pub fn mine_block(&mut self, miner: &str) -> Block {
        let previous_hash = self
            .blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| "0".to_string());
        let index = self.height();
        let included: Vec<String> = std::mem::take(&mut self.pending);
        for id in &included {
            if let Some(tx) = self.transactions.get_mut(id) {
                tx.status = "confirmed".to_string();
                tx.block_index = Some(index);
            }
        }
        let block = Block {
            index,
            hash: random_hash(),
            previous_hash,
            timestamp: now_millis(),
            transactions: included,
            miner: Some(miner.to_string()),
        };
        self.blocks.push(block.clone());
        self.credit(miner, BLOCK_REWARD);
        *self.mined_by.entry(miner.to_string()).or_insert(0) += 1;
        block
    }

    pub fn deploy(&mut self, code: &str, owner: &str, private_key: &str) -> Outcome<Contract> {
        if code.trim().is_empty() {
            return Err(Rejection::BadRequest("contract code is required".to_string()));
        }
        self.authorize(owner, private_key)?;
        let contract = Contract {
            address: random_address(),
            owner: owner.to_string(),
            code: code.to_string(),
            state: Map::new(),
            deployed_at: now_millis(),
        };
        self.contracts.push(contract.clone());
        Ok(contract)
    }

    pub fn contract(&self, address: &str) -> Outcome<&Contract> {
        self.contracts
            .iter()
            .find(|c| c.address == address)
            .ok_or_else(|| Rejection::NotFound(format!("contract {address} not found")))
    }

    /// Record the call in the contract's state and echo it back.
    pub fn call(
        &mut self,
        address: &str,
        method: &str,
        params: &[Value],
        caller: &str,
        private_key: &str,
    ) -> Outcome<Value> {
        self.authorize(caller, private_key)?;
        let contract = self
            .contracts
            .iter_mut()
            .find(|c| c.address == address)
            .ok_or_else(|| Rejection::NotFound(format!("contract {address} not found")))?;
        let calls = contract
            .state
            .get("calls")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;
        contract.state.insert("calls".to_string(), Value::from(calls));
        contract
            .state
            .insert("lastMethod".to_string(), Value::from(method));
        contract
            .state
            .insert("lastCaller".to_string(), Value::from(caller));
        Ok(serde_json::json!({
            "contractAddress": address,
            "method": method,
            "params": params,
            "calls": calls,
        }))
    }

    pub fn stake(&mut self, address: &str, amount: f64, private_key: &str) -> Outcome<f64> {
        self.authorize(address, private_key)?;
        self.debit(address, amount)?;
        let staked = self.staked(address) + amount;
        self.stakes.insert(address.to_string(), staked);
        Ok(staked)
    }

    pub fn unstake(&mut self, address: &str, amount: f64, private_key: &str) -> Outcome<f64> {
        self.authorize(address, private_key)?;
        if amount.is_nan() || amount <= 0.0 {
            return Err(Rejection::BadRequest("amount must be positive".to_string()));
        }
        let staked = self.staked(address);
        if staked < amount {
            return Err(Rejection::BadRequest("insufficient stake".to_string()));
        }
        self.stakes.insert(address.to_string(), staked - amount);
        self.credit(address, amount);
        Ok(staked - amount)
    }

    pub fn pending_rewards(&self, address: &str) -> f64 {
        self.staked(address) * STAKING_REWARD_RATE
    }

    pub fn claim(&mut self, address: &str, private_key: &str) -> Outcome<f64> {
        self.authorize(address, private_key)?;
        let rewards = self.pending_rewards(address);
        if rewards <= 0.0 {
            return Err(Rejection::BadRequest("no rewards to claim".to_string()));
        }
        self.credit(address, rewards);
        Ok(rewards)
    }

    pub fn mint(&mut self, metadata: Value) -> Outcome<Nft> {
        let owner = metadata
            .get("owner")
            .and_then(Value::as_str)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| Rejection::BadRequest("owner is required".to_string()))?
            .to_string();
        let nft = Nft {
            token_id: self.nfts.len() as u64 + 1,
            owner,
            metadata,
        };
        self.nfts.push(nft.clone());
        Ok(nft)
    }

    pub fn nft(&self, token_id: u64) -> Outcome<&Nft> {
        self.nfts
            .iter()
            .find(|n| n.token_id == token_id)
            .ok_or_else(|| Rejection::NotFound(format!("token {token_id} not found")))
    }

    pub fn transfer_nft(
        &mut self,
        token_id: u64,
        from: &str,
        to: &str,
        private_key: &str,
    ) -> Outcome<Nft> {
        self.authorize(from, private_key)?;
        let nft = self
            .nfts
            .iter_mut()
            .find(|n| n.token_id == token_id)
            .ok_or_else(|| Rejection::NotFound(format!("token {token_id} not found")))?;
        if nft.owner != from {
            return Err(Rejection::Forbidden(format!("{from} does not own token {token_id}")));
        }
        nft.owner = to.to_string();
        Ok(nft.clone())
    }

    pub fn propose(&mut self, data: &Value) -> Outcome<Proposal> {
        let title = data
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Rejection::BadRequest("title is required".to_string()))?;
        let proposal = Proposal {
            id: self.proposals.len() as u64 + 1,
            title: title.to_string(),
            description: data
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            proposer: data
                .get("proposer")
                .and_then(Value::as_str)
                .map(str::to_string),
            status: "active".to_string(),
            votes_for: 0,
            votes_against: 0,
            voters: HashSet::new(),
        };
        self.proposals.push(proposal.clone());
        Ok(proposal)
    }

    pub fn proposal(&self, id: u64) -> Outcome<&Proposal> {
        self.proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Rejection::NotFound(format!("proposal {id} not found")))
    }

    pub fn vote(
        &mut self,
        proposal_id: u64,
        support: bool,
        voter: &str,
        private_key: &str,
    ) -> Outcome<Proposal> {
        self.authorize(voter, private_key)?;
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == proposal_id)
            .ok_or_else(|| Rejection::NotFound(format!("proposal {proposal_id} not found")))?;
        if proposal.status != "active" {
            return Err(Rejection::Conflict(format!("proposal {proposal_id} is closed")));
        }
        if !proposal.voters.insert(voter.to_string()) {
            return Err(Rejection::Conflict(format!("{voter} already voted")));
        }
        if support {
            proposal.votes_for += 1;
        } else {
            proposal.votes_against += 1;
        }
        Ok(proposal.clone())
    }

    /// Addresses by balance, richest first.
    pub fn rich_list(&self, limit: usize) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .balances
            .iter()
            .map(|(a, b)| (a.clone(), *b))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }

    pub fn total_supply(&self) -> f64 {
        self.balances.values().sum::<f64>() + self.stakes.values().sum::<f64>()
    }
}
