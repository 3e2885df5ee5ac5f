//! Conjure Protocol — shared JSON-RPC types and payload definitions.

mod generate;
mod jsonrpc;

pub use generate::{GenerateRequest, GenerateResponse, HistoryResponse};
pub use jsonrpc::*;
