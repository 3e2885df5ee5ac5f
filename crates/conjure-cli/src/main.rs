use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conjure_daemon::config::Config;
use conjure_daemon::server::{self, Server};
use conjure_protocol::{methods, GenerateResponse, HistoryResponse, JsonRpcRequest, JsonRpcResponse, RequestId};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Parser)]
#[command(
    name = "conjure",
    about = "Turn natural-language requests into shell commands"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Conjure daemon
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
    /// Generate a shell command from a natural-language description
    Generate {
        /// What the command should do
        text: Vec<String>,
    },
    /// List past requests, most recent first
    History,
    /// Clear the request history
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { foreground, config } => cmd_start(foreground, config).await,
        Commands::Stop => cmd_stop().await,
        Commands::Status => cmd_status().await,
        Commands::Generate { text } => cmd_generate(text.join(" ")).await,
        Commands::History => cmd_history().await,
        Commands::ClearHistory => cmd_clear_history().await,
    }
}

async fn cmd_start(foreground: bool, config_path: Option<String>) -> Result<()> {
    // Check if already running
    if is_daemon_running() {
        println!("Conjure daemon is already running.");
        return Ok(());
    }

    let config = match &config_path {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };

    if foreground {
        server::init_tracing(&config.daemon.log_level);
        println!("Starting Conjure daemon (foreground)...");
        let server = Server::new(config);
        server.run().await?;
    } else {
        // Spawn as background process
        let exe = std::env::current_exe()?;
        let mut args = vec!["start".to_string(), "--foreground".to_string()];
        if let Some(path) = config_path {
            args.push("--config".to_string());
            args.push(path);
        }

        let child = std::process::Command::new(exe)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("Failed to spawn daemon process")?;

        println!("Conjure daemon started (PID: {})", child.id());
    }

    Ok(())
}

async fn cmd_stop() -> Result<()> {
    if !is_daemon_running() {
        println!("Conjure daemon is not running.");
        return Ok(());
    }

    // Send shutdown via socket
    let config = Config::load().unwrap_or_default();
    match send_request(&config.daemon.socket_path, methods::SHUTDOWN, None).await {
        Ok(_) => println!("Conjure daemon stopped."),
        Err(_) => {
            // Fallback: kill via PID
            if let Ok(pid_str) = std::fs::read_to_string(Config::pid_path()) {
                if let Ok(pid) = pid_str.trim().parse::<i32>() {
                    unsafe {
                        libc::kill(pid, libc::SIGTERM);
                    }
                    let _ = std::fs::remove_file(Config::pid_path());
                    println!("Conjure daemon stopped (via signal).");
                }
            }
        }
    }

    Ok(())
}

async fn cmd_status() -> Result<()> {
    if !is_daemon_running() {
        println!("Conjure daemon is not running.");
        return Ok(());
    }

    let config = Config::load().unwrap_or_default();
    match send_request(&config.daemon.socket_path, methods::STATUS, None).await {
        Ok(response) => {
            if let Some(result) = response.result {
                println!("Conjure daemon status:");
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Err(e) => {
            println!("Failed to get status: {e}");
        }
    }

    Ok(())
}

async fn cmd_generate(text: String) -> Result<()> {
    if !is_daemon_running() {
        anyhow::bail!("Conjure daemon is not running. Start it with: conjure start");
    }

    let config = Config::load().unwrap_or_default();
    let params = serde_json::json!({ "text": text });
    let response =
        send_request(&config.daemon.socket_path, methods::GENERATE, Some(params)).await?;

    if let Some(error) = response.error {
        anyhow::bail!("{}", error.message);
    }

    let result = response.result.context("Daemon returned an empty response")?;
    let generated: GenerateResponse = serde_json::from_value(result)?;
    println!("{}", generated.command);

    Ok(())
}

async fn cmd_history() -> Result<()> {
    if !is_daemon_running() {
        anyhow::bail!("Conjure daemon is not running. Start it with: conjure start");
    }

    let config = Config::load().unwrap_or_default();
    let response =
        send_request(&config.daemon.socket_path, methods::HISTORY_LIST, None).await?;

    let result = response.result.context("Daemon returned an empty response")?;
    let history: HistoryResponse = serde_json::from_value(result)?;
    for entry in history.entries {
        println!("{entry}");
    }

    Ok(())
}

async fn cmd_clear_history() -> Result<()> {
    if !is_daemon_running() {
        anyhow::bail!("Conjure daemon is not running. Start it with: conjure start");
    }

    let config = Config::load().unwrap_or_default();
    send_request(&config.daemon.socket_path, methods::HISTORY_CLEAR, None).await?;
    println!("History cleared.");

    Ok(())
}

/// Send a JSON-RPC request to the daemon and return the response.
async fn send_request(
    socket_path: &str,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<JsonRpcResponse> {
    let stream = UnixStream::connect(socket_path).await?;
    let (reader, mut writer) = stream.into_split();

    let request = JsonRpcRequest::new(method, params, RequestId::Number(1));
    let json = serde_json::to_string(&request)?;

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: JsonRpcResponse = serde_json::from_str(&line)?;
    Ok(response)
}

fn is_daemon_running() -> bool {
    let pid_path = Config::pid_path();
    if !pid_path.exists() {
        return false;
    }

    if let Ok(pid_str) = std::fs::read_to_string(&pid_path) {
        if let Ok(pid) = pid_str.trim().parse::<i32>() {
            // Check if process is alive
            unsafe { libc::kill(pid, 0) == 0 }
        } else {
            false
        }
    } else {
        false
    }
}
