use conjure_daemon::config::{Config, ContextConfig, DaemonConfig, HistoryConfig};
use conjure_daemon::server::Server;
use conjure_generator::GeneratorConfig;
use conjure_protocol::*;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Create a test config with unique socket and history paths.
fn test_config(name: &str) -> Config {
    let pid = std::process::id();
    Config {
        daemon: DaemonConfig {
            socket_path: format!("/tmp/conjure-test-{name}-{pid}.sock"),
            log_level: "warn".to_string(),
        },
        generator: GeneratorConfig::default(),
        context: ContextConfig {
            enabled: false,
            query_timeout_ms: 100,
        },
        history: HistoryConfig {
            path: format!("/tmp/conjure-test-{name}-{pid}-history"),
        },
    }
}

/// A config whose generator is "configured" but points at a dead endpoint,
/// so the pipeline runs without ever reaching a real API.
fn test_config_with_generator(name: &str) -> Config {
    let mut config = test_config(name);
    config.generator = GeneratorConfig {
        api_key: Some("sk-test".to_string()),
        model: None,
        endpoint: Some("http://127.0.0.1:1/v1/messages".to_string()),
        timeout_ms: 2000,
        max_tokens: 256,
    };
    config
}

/// Send a JSON-RPC request and read the response.
async fn send_request(
    socket_path: &str,
    method: &str,
    params: Option<serde_json::Value>,
) -> JsonRpcResponse {
    let stream = UnixStream::connect(socket_path).await.unwrap();
    let (reader, mut writer) = stream.into_split();

    let request = JsonRpcRequest::new(method, params, RequestId::Number(1));
    let json = serde_json::to_string(&request).unwrap();

    writer.write_all(json.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();

    serde_json::from_str(&line).unwrap()
}

/// Start a daemon server in the background for testing.
async fn start_test_server(config: Config) {
    let server = Server::new(config);
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    // Give the server a moment to bind
    tokio::time::sleep(Duration::from_millis(100)).await;
}

fn cleanup(config: &Config) {
    let _ = std::fs::remove_file(&config.daemon.socket_path);
    let _ = std::fs::remove_dir_all(&config.history.path);
}

#[tokio::test]
async fn test_status_request() {
    let config = test_config("status");
    let socket = config.daemon.socket_path.clone();

    start_test_server(config).await;

    let response = send_request(&socket, methods::STATUS, None).await;

    assert!(response.error.is_none(), "Status should not return error");
    let result = response.result.unwrap();
    assert_eq!(result["status"], "running");
    assert_eq!(result["state"], "idle");
    assert_eq!(result["generator_configured"], false);

    let _ = std::fs::remove_file(&socket);
}

#[tokio::test]
async fn test_invalid_method() {
    let config = test_config("method");
    let socket = config.daemon.socket_path.clone();

    start_test_server(config).await;

    let response = send_request(&socket, "nonexistent/method", None).await;

    assert!(response.error.is_some());
    assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

    let _ = std::fs::remove_file(&socket);
}

#[tokio::test]
async fn test_generate_missing_params() {
    let config = test_config("params");
    let socket = config.daemon.socket_path.clone();

    start_test_server(config).await;

    let response = send_request(&socket, methods::GENERATE, None).await;

    assert!(response.error.is_some());
    assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

    let _ = std::fs::remove_file(&socket);
}

#[tokio::test]
async fn test_generate_without_generator() {
    let config = test_config("nogen");
    let socket = config.daemon.socket_path.clone();

    start_test_server(config).await;

    let params = serde_json::json!({"text": "list files"});
    let response = send_request(&socket, methods::GENERATE, Some(params)).await;

    let error = response.error.unwrap();
    assert_eq!(error.code, GENERATION_FAILED);
    assert!(error.message.contains("not configured"));

    let _ = std::fs::remove_file(&socket);
}

#[tokio::test]
async fn test_generate_empty_request_is_rejected_before_loading() {
    let config = test_config_with_generator("empty");
    let socket = config.daemon.socket_path.clone();

    start_test_server(config).await;

    let params = serde_json::json!({"text": "   "});
    let response = send_request(&socket, methods::GENERATE, Some(params)).await;
    assert_eq!(response.error.unwrap().code, EMPTY_REQUEST);

    // validation failures never leave idle
    let status = send_request(&socket, methods::STATUS, None).await;
    assert_eq!(status.result.unwrap()["state"], "idle");

    let _ = std::fs::remove_file(&socket);
}

#[tokio::test]
async fn test_failed_generation_surfaces_error_and_records_nothing() {
    let config = test_config_with_generator("dead-endpoint");
    let socket = config.daemon.socket_path.clone();
    let cleanup_config = test_config_with_generator("dead-endpoint");

    start_test_server(config).await;

    let params = serde_json::json!({"text": "list files sorted by size"});
    let response = send_request(&socket, methods::GENERATE, Some(params)).await;
    assert_eq!(response.error.unwrap().code, GENERATION_FAILED);

    // the failed request was not recorded
    let history = send_request(&socket, methods::HISTORY_LIST, None).await;
    let entries = &history.result.unwrap()["entries"];
    assert_eq!(entries.as_array().unwrap().len(), 0);

    let status = send_request(&socket, methods::STATUS, None).await;
    assert_eq!(status.result.unwrap()["state"], "error");

    cleanup(&cleanup_config);
}

#[tokio::test]
async fn test_history_list_and_clear() {
    let config = test_config("history");
    let socket = config.daemon.socket_path.clone();
    let cleanup_config = test_config("history");

    start_test_server(config).await;

    let response = send_request(&socket, methods::HISTORY_LIST, None).await;
    let result = response.result.unwrap();
    assert!(result["entries"].as_array().unwrap().is_empty());

    let response = send_request(&socket, methods::HISTORY_CLEAR, None).await;
    assert!(response.error.is_none());

    let response = send_request(&socket, methods::HISTORY_LIST, None).await;
    assert!(response.result.unwrap()["entries"]
        .as_array()
        .unwrap()
        .is_empty());

    cleanup(&cleanup_config);
}
