use serde::{Deserialize, Serialize};

/// Request to turn a natural-language description into a shell command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// What the user asked for, verbatim.
    pub text: String,
}

/// Response for a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated shell command.
    pub command: String,
    /// Request history after recording this request, most recent first.
    pub history: Vec<String>,
    /// Time taken for the whole pipeline run (milliseconds).
    pub latency_ms: u64,
}

/// Response listing past requests, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub entries: Vec<String>,
}
