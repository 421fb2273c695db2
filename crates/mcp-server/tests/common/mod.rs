use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal line-delimited JSON-RPC client driving the server binary over stdio.
///
/// Exists only for integration tests.
pub struct McpStdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpStdioSession {
    /// Spawn the server against `api_base` and complete the MCP handshake.
    pub async fn start(api_base: &str, extra_args: &[&str]) -> anyhow::Result<Self> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_klaud-api-mcp"))
            .arg("--api-base")
            .arg(api_base)
            .args(extra_args)
            .env_remove("KLAUD_API_KEY")
            .env_remove("KLAUD_STORE_TOKEN")
            .env_remove("KLAUD_AGENT_TOKEN")
            .env_remove("KLAUD_API_BASE")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn klaud-api-mcp")?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;
        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "klaud-api-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(init.get("result").is_some(), "initialize failed: {init}");

        session
            .send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await?;
        Ok(session)
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');
        self.stdin.write_all(&line).await.context("write stdin")?;
        self.stdin.flush().await.context("flush stdin")?;
        Ok(())
    }

    /// Send a request and wait for the response carrying the same id.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;

        tokio::time::timeout(RESPONSE_TIMEOUT, async {
            loop {
                let line = self
                    .stdout
                    .next_line()
                    .await
                    .context("read stdout")?
                    .context("server closed stdout")?;
                let msg: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if msg.get("id") == Some(&json!(id)) {
                    return Ok::<_, anyhow::Error>(msg);
                }
            }
        })
        .await
        .context("timeout waiting for response")?
    }

    pub async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let msg = self
            .request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        msg.get("result").cloned().context("tools/call missing result")
    }
}

/// `result.content[0].text` of a tool call result.
pub fn result_text(result: &Value) -> anyhow::Result<&str> {
    result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .context("tools/call missing result.content[0].text")
}
