use conjure_history::HistoryStore;
use conjure_protocol::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::pipeline::{Pipeline, PipelineError, PipelineState};

/// Handles incoming JSON-RPC requests.
pub struct RequestHandler {
    config: Arc<Config>,
    /// Absent when no generator could be configured; history methods still
    /// work in that case.
    pipeline: Option<Arc<Pipeline>>,
    history: HistoryStore,
}

impl RequestHandler {
    pub fn new(
        config: Arc<Config>,
        pipeline: Option<Arc<Pipeline>>,
        history: HistoryStore,
    ) -> Self {
        Self {
            config,
            pipeline,
            history,
        }
    }

    /// Process a JSON-RPC request and return a response.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Handling request");

        match request.method.as_str() {
            methods::GENERATE => self.handle_generate(request).await,
            methods::HISTORY_LIST => self.handle_history_list(request).await,
            methods::HISTORY_CLEAR => self.handle_history_clear(request).await,
            methods::STATUS => self.handle_status(request).await,
            methods::SHUTDOWN => self.handle_shutdown(request).await,
            _ => JsonRpcResponse::error(
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
                request.id,
            ),
        }
    }

    async fn handle_generate(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: GenerateRequest = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        INVALID_PARAMS,
                        format!("Invalid params: {e}"),
                        request.id,
                    )
                }
            },
            None => return JsonRpcResponse::error(INVALID_PARAMS, "Missing params", request.id),
        };

        let Some(pipeline) = &self.pipeline else {
            return JsonRpcResponse::error(
                GENERATION_FAILED,
                "Generator not configured: set generator.api_key",
                request.id,
            );
        };

        let start = std::time::Instant::now();
        match pipeline.run(&params.text).await {
            Ok(outcome) => {
                let response = GenerateResponse {
                    command: outcome.command,
                    history: outcome.history,
                    latency_ms: start.elapsed().as_millis() as u64,
                };
                JsonRpcResponse::success(serde_json::to_value(&response).unwrap(), request.id)
            }
            Err(e) => JsonRpcResponse::error(error_code(&e), e.to_string(), request.id),
        }
    }

    async fn handle_history_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let response = HistoryResponse {
            entries: self.history.list().await,
        };
        JsonRpcResponse::success(serde_json::to_value(&response).unwrap(), request.id)
    }

    async fn handle_history_clear(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.history.clear().await;
        info!("History cleared");
        JsonRpcResponse::success(Value::Bool(true), request.id)
    }

    async fn handle_status(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let state = match &self.pipeline {
            Some(pipeline) => pipeline.state().await,
            None => PipelineState::Idle,
        };
        let status = serde_json::json!({
            "status": "running",
            "state": state.as_str(),
            "generator_configured": self.pipeline.is_some(),
            "context_enabled": self.config.context.enabled,
            "history_entries": self.history.list().await.len(),
        });
        JsonRpcResponse::success(status, request.id)
    }

    async fn handle_shutdown(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("Shutdown requested");
        JsonRpcResponse::success(Value::String("shutting down".to_string()), request.id)
    }
}

/// Map pipeline failures onto the application error codes.
fn error_code(error: &PipelineError) -> i32 {
    match error {
        PipelineError::EmptyRequest => EMPTY_REQUEST,
        PipelineError::Busy => PIPELINE_BUSY,
        PipelineError::Model(_) => GENERATION_FAILED,
        PipelineError::EmptyGeneration => GENERATION_EMPTY,
    }
}
