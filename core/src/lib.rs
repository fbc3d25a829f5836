//! Blocking client SDK for the STRAT blockchain node REST API.
//!
//! # Overview
//! `StratClient` turns typed method calls into HTTP requests against a
//! remote node and hands back the node's JSON. No chain logic runs here:
//! no signing, validation or state; the node's answers are trusted as-is.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest` /
//!   `HttpResponse`); a `Transport` executes them. `UreqTransport` is the
//!   pooled default, tests plug in scripted ones.
//! - Failures are classified once, in the client, into `StratError`:
//!   `Network`, `Api` or `Generic`.
//! - The client owns its connection pool; `close` or drop releases it.
//! - `units` holds the offline helpers (address check, base units).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod units;

pub use client::StratClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ErrorKind, StratError, StratResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{build_transaction, BatchRequest, TransactionDraft, TransactionType};
pub use units::{
    checked_to_base_units, from_base_units, is_valid_address, to_base_units, BASE_UNITS_PER_TOKEN,
};
