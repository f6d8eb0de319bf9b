//! MCP session over stdio: child process, newline-delimited JSON-RPC.
//!
//! A background reader task routes each response to the request waiting on its
//! id and answers server requests (`ping`). A dropped request future removes its
//! pending slot, so cancellation leaves no stale state. `close` drops stdin so
//! the server sees EOF, then waits for it to exit before killing it. The child
//! is spawned with `kill_on_drop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};

use super::protocol::{
    initialize_params, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ServerMessage,
    ServerRequest,
};
use crate::tool_source::ToolSourceError;

const INIT_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type Pending = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Child stdin; `None` once `close` has released it.
type Writer = Arc<Mutex<Option<BufWriter<ChildStdin>>>>;

async fn write_line(writer: &Writer, line: &str) -> std::io::Result<()> {
    let mut slot = writer.lock().await;
    let w = slot
        .as_mut()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))?;
    w.write_all(line.as_bytes()).await?;
    w.write_all(b"\n").await?;
    w.flush().await
}

/// MCP session with a spawned server process.
pub struct McpStdioSession {
    command: String,
    child: Mutex<Option<Child>>,
    writer: Writer,
    pending: Pending,
    next_id: AtomicU64,
    disconnected: Arc<AtomicBool>,
}

/// Removes the pending slot when the request future completes or is dropped.
struct PendingGuard<'a> {
    pending: &'a Pending,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut map) = self.pending.lock() {
            map.remove(&self.id);
        }
    }
}

impl McpStdioSession {
    /// Spawns `command args...` and performs the initialize handshake.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<Self, ToolSourceError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);
        let mut child = cmd
            .spawn()
            .map_err(|e| ToolSourceError::Disconnected(format!("failed to spawn {}: {}", command, e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolSourceError::Transport("child stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolSourceError::Transport("child stdout not captured".into()))?;

        let session = Self {
            command: command.to_string(),
            child: Mutex::new(Some(child)),
            writer: Arc::new(Mutex::new(Some(BufWriter::new(stdin)))),
            pending: Arc::new(std::sync::Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            disconnected: Arc::new(AtomicBool::new(false)),
        };
        spawn_reader(
            stdout,
            Arc::clone(&session.writer),
            Arc::clone(&session.pending),
            Arc::clone(&session.disconnected),
            session.command.clone(),
        );

        let handshake = async {
            session.request("initialize", Some(initialize_params())).await?;
            session.notify("notifications/initialized").await
        };
        match tokio::time::timeout(INIT_TIMEOUT, handshake).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                session.close().await;
                return Err(e);
            }
            Err(_) => {
                session.close().await;
                return Err(ToolSourceError::Timeout(INIT_TIMEOUT));
            }
        }
        tracing::debug!(command = %session.command, "MCP stdio session initialized");
        Ok(session)
    }

    pub fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::Acquire)
    }

    async fn write_line(&self, line: String) -> Result<(), ToolSourceError> {
        write_line(&self.writer, &line).await.map_err(|e| {
            self.disconnected.store(true, Ordering::Release);
            ToolSourceError::Disconnected(format!("write to {} failed: {}", self.command, e))
        })
    }

    pub async fn notify(&self, method: &str) -> Result<(), ToolSourceError> {
        let line = serde_json::to_string(&JsonRpcNotification::new(method, None))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        self.write_line(line).await
    }

    /// Sends one request and waits for the matching response. No timeout here;
    /// the session applies the per-call timeout.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ToolSourceError> {
        if !self.is_connected() {
            return Err(ToolSourceError::Disconnected(format!("{} has exited", self.command)));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&JsonRpcRequest::new(id, method, params))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        if let Ok(mut map) = self.pending.lock() {
            map.insert(id, tx);
        }
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };
        // The reader may have exited between the first check and the insert.
        if !self.is_connected() {
            return Err(ToolSourceError::Disconnected(format!("{} has exited", self.command)));
        }
        self.write_line(line).await?;

        let response = rx.await.map_err(|_| {
            ToolSourceError::Disconnected(format!("{} closed before responding", self.command))
        })?;
        response.into_result()
    }

    /// Closes stdin, waits briefly for the child to exit, then kills it.
    pub async fn close(&self) {
        let stdin = self.writer.lock().await.take();
        if let Some(mut stdin) = stdin {
            let _ = stdin.flush().await;
            // Dropping the handle closes the pipe; the server reads EOF.
            drop(stdin);
        }
        let mut child = self.child.lock().await;
        if let Some(mut c) = child.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, c.wait()).await.is_err() {
                let _ = c.kill().await;
            }
        }
        self.disconnected.store(true, Ordering::Release);
        if let Ok(mut map) = self.pending.lock() {
            map.clear();
        }
    }
}

/// Writes the reply to a server request. Failures only mean the child is going away.
async fn answer(writer: &Writer, request: &ServerRequest) {
    tracing::debug!(method = %request.method, id = %request.id, "MCP server request");
    match serde_json::to_string(&request.reply()) {
        Ok(line) => {
            if let Err(e) = write_line(writer, &line).await {
                tracing::debug!(error = %e, "could not answer MCP server request");
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not encode reply to MCP server request"),
    }
}

fn spawn_reader(
    stdout: ChildStdout,
    writer: Writer,
    pending: Pending,
    disconnected: Arc<AtomicBool>,
    command: String,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match ServerMessage::from_line(line) {
                        Ok(ServerMessage::Response(resp)) => {
                            let sender = resp
                                .id_u64()
                                .and_then(|id| pending.lock().ok().and_then(|mut m| m.remove(&id)));
                            match sender {
                                Some(tx) => {
                                    let _ = tx.send(resp);
                                }
                                None => tracing::debug!(id = %resp.id, "response for unknown or abandoned request"),
                            }
                        }
                        Ok(ServerMessage::Request(request)) => answer(&writer, &request).await,
                        Ok(ServerMessage::Notification(n)) => {
                            tracing::trace!(method = %n.method, "MCP server notification");
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "ignoring non-JSON-RPC line from MCP server");
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(command = %command, "MCP server closed stdout");
                    break;
                }
                Err(e) => {
                    tracing::warn!(command = %command, error = %e, "MCP server read error");
                    break;
                }
            }
        }
        disconnected.store(true, Ordering::Release);
        // Dropping the senders fails every waiting request with Disconnected.
        if let Ok(mut map) = pending.lock() {
            map.clear();
        }
    });
}
