// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP client for a single server.
//!
//! [`McpConnection`] is the seam the rest of the crate talks to. [`McpClient`]
//! implements it as a JSON-RPC 2.0 session over newline-delimited stdio:
//! a writer task drains an mpsc queue into the server's stdin and a reader
//! task routes each response to the oneshot channel of the request with the
//! same id. Requests may be issued concurrently from any number of tasks.
//!
//! When the server's stdout closes the connection is marked dead, every
//! pending request fails with [`McpError::ConnectionClosed`] and so does
//! every later request.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::config::ServerConfig;
use super::error::McpError;
use super::types::{
    CallToolResult, GetPromptResult, InitializeResult, ListPromptsResult, ListResourcesResult,
    ListToolsResult, McpPromptInfo, McpResourceInfo, McpToolInfo, ReadResourceResult, ServerInfo,
    PROTOCOL_VERSION,
};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

/// How long `close` waits for the server to exit after stdin is closed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// A live session with one MCP server.
///
/// Methods take `&self` so a connection can be shared behind an `Arc` by
/// the registry and by every chat session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait McpConnection: Send + Sync {
    /// Whether requests can still be served.
    fn is_alive(&self) -> bool;

    /// `tools/list`, all pages.
    async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError>;

    /// `prompts/list`, all pages.
    async fn list_prompts(&self) -> Result<Vec<McpPromptInfo>, McpError>;

    /// `resources/list`, all pages.
    async fn list_resources(&self) -> Result<Vec<McpResourceInfo>, McpError>;

    /// `tools/call`. A result with `is_error` set is still `Ok`.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError>;

    /// `prompts/get` with the given argument object.
    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<GetPromptResult, McpError>;

    /// `resources/read`.
    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError>;

    /// Close the session. Safe to call more than once.
    async fn close(&self);
}

/// Response half of a JSON-RPC exchange.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<RpcResponse>>>>;

/// JSON-RPC client for one MCP server.
pub struct McpClient {
    name: String,
    /// Outgoing message queue. `None` once closed.
    tx: Mutex<Option<mpsc::Sender<String>>>,
    pending: PendingMap,
    request_id: AtomicU64,
    alive: Arc<AtomicBool>,
    request_timeout: Duration,
    server_info: OnceLock<ServerInfo>,
    child: Mutex<Option<Child>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl McpClient {
    /// Spawn the configured server and complete the MCP handshake.
    ///
    /// Spawn failures, handshake errors and a handshake that exceeds
    /// `startup_timeout_sec` all become [`McpError::ConnectionFailed`]
    /// naming the server.
    pub async fn connect(name: &str, config: &ServerConfig) -> Result<Self, McpError> {
        let client = Self::spawn(name, config).map_err(|e| McpError::connection_failed(name, e))?;

        let startup = Duration::from_secs(config.startup_timeout_sec);
        match client.initialize(startup).await {
            Ok(server_info) => {
                info!(
                    server = name,
                    remote = %server_info.name,
                    version = %server_info.version,
                    "Connected to MCP server"
                );
                Ok(client)
            }
            Err(e) => {
                client.close().await;
                Err(McpError::connection_failed(name, e))
            }
        }
    }

    /// Spawn the server process and attach to its stdio without handshaking.
    pub fn spawn(name: &str, config: &ServerConfig) -> Result<Self, McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::connection_failed(name, "Failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::connection_failed(name, "Failed to get stdout"))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(name.to_string(), stderr));
        }

        Ok(Self::attach(
            name.to_string(),
            stdout,
            stdin,
            Duration::from_secs(config.tool_timeout_sec),
            Some(child),
        ))
    }

    /// Attach to an already-open byte stream pair.
    ///
    /// `reader` carries server-to-client messages and `writer` the other
    /// direction. Must be called inside a Tokio runtime.
    pub fn from_streams<R, W>(
        name: impl Into<String>,
        reader: R,
        writer: W,
        request_timeout: Duration,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::attach(name.into(), reader, writer, request_timeout, None)
    }

    fn attach<R, W>(
        name: String,
        reader: R,
        writer: W,
        request_timeout: Duration,
        child: Option<Child>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel::<String>(64);

        tokio::spawn(write_messages(
            name.clone(),
            writer,
            rx,
            Arc::clone(&pending),
            Arc::clone(&alive),
        ));

        let reader = tokio::spawn(read_messages(
            name.clone(),
            reader,
            tx.clone(),
            Arc::clone(&pending),
            Arc::clone(&alive),
        ));

        Self {
            name,
            tx: Mutex::new(Some(tx)),
            pending,
            request_id: AtomicU64::new(1),
            alive,
            request_timeout,
            server_info: OnceLock::new(),
            child: Mutex::new(child),
            reader: Mutex::new(Some(reader)),
        }
    }

    /// Server name from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server identity, once initialized.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.get()
    }

    /// Run `initialize` and send `notifications/initialized`.
    pub async fn initialize(&self, timeout: Duration) -> Result<ServerInfo, McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "papertrail",
                "version": crate::VERSION
            }
        });

        let result: InitializeResult = self
            .request_with_timeout("initialize", params, timeout)
            .await?;

        if let Some(version) = result.protocol_version.as_deref() {
            if version != PROTOCOL_VERSION {
                debug!(server = %self.name, version, "Server negotiated a different protocol version");
            }
        }

        self.notify("notifications/initialized", json!({})).await?;

        let _ = self.server_info.set(result.server_info.clone());
        Ok(result.server_info)
    }

    async fn sender(&self) -> Result<mpsc::Sender<String>, McpError> {
        self.tx
            .lock()
            .await
            .clone()
            .ok_or_else(|| McpError::ConnectionClosed(self.name.clone()))
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, McpError> {
        self.request_with_timeout(method, params, self.request_timeout)
            .await
    }

    async fn request_with_timeout<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<T, McpError> {
        if !self.is_alive() {
            return Err(McpError::ConnectionClosed(self.name.clone()));
        }

        #[cfg(feature = "telemetry")]
        let start = std::time::Instant::now();

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        // The reader marks the connection dead before draining, so a request
        // registered after the drain is caught here.
        if !self.is_alive() {
            self.pending.lock().await.remove(&id);
            return Err(McpError::ConnectionClosed(self.name.clone()));
        }

        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        })
        .to_string();

        trace!(server = %self.name, id, method, "-> request");
        if self.sender().await?.send(message).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(McpError::ConnectionClosed(self.name.clone()));
        }

        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(McpError::ConnectionClosed(self.name.clone())),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(McpError::Timeout {
                    server: self.name.clone(),
                    method: method.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation(&format!("mcp.{}", method), start.elapsed());

        if let Some(error) = response.error {
            return Err(McpError::protocol(error.code, error.message));
        }

        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| McpError::InvalidResponse(format!("{}: {}", method, e)))
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), McpError> {
        let message = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        })
        .to_string();

        self.sender()
            .await?
            .send(message)
            .await
            .map_err(|_| McpError::ConnectionClosed(self.name.clone()))
    }

    async fn list_all<P: Page>(&self, method: &str) -> Result<Vec<P::Item>, McpError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let page: P = self.request(method, params).await?;
            let (batch, next) = page.into_parts();
            items.extend(batch);

            match next {
                // A server repeating its cursor would loop forever.
                Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next)
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl McpConnection for McpClient {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        self.list_all::<ListToolsResult>("tools/list").await
    }

    async fn list_prompts(&self) -> Result<Vec<McpPromptInfo>, McpError> {
        self.list_all::<ListPromptsResult>("prompts/list").await
    }

    async fn list_resources(&self) -> Result<Vec<McpResourceInfo>, McpError> {
        self.list_all::<ListResourcesResult>("resources/list").await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<GetPromptResult, McpError> {
        self.request("prompts/get", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.request("resources/read", json!({ "uri": uri })).await
    }

    async fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);

        // The reader holds a sender for rejecting server requests. Once both
        // senders are gone the writer task ends and closes stdin.
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        self.tx.lock().await.take();
        self.pending.lock().await.clear();

        if let Some(mut child) = self.child.lock().await.take() {
            if tokio::time::timeout(EXIT_GRACE, child.wait()).await.is_err() {
                debug!(server = %self.name, "Server did not exit, killing it");
                let _ = child.kill().await;
            }
        }
    }
}

/// A paginated `*/list` result.
trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for ListToolsResult {
    type Item = McpToolInfo;

    fn into_parts(self) -> (Vec<McpToolInfo>, Option<String>) {
        (self.tools, self.next_cursor)
    }
}

impl Page for ListPromptsResult {
    type Item = McpPromptInfo;

    fn into_parts(self) -> (Vec<McpPromptInfo>, Option<String>) {
        (self.prompts, self.next_cursor)
    }
}

impl Page for ListResourcesResult {
    type Item = McpResourceInfo;

    fn into_parts(self) -> (Vec<McpResourceInfo>, Option<String>) {
        (self.resources, self.next_cursor)
    }
}

/// Drain queued messages into the server's stdin, one per line.
async fn write_messages<W>(
    name: String,
    mut writer: W,
    mut rx: mpsc::Receiver<String>,
    pending: PendingMap,
    alive: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let written = async {
            writer.write_all(message.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!(server = %name, error = %e, "Failed writing to MCP server");
            alive.store(false, Ordering::SeqCst);
            pending.lock().await.clear();
            return;
        }
    }
    let _ = writer.shutdown().await;
}

/// Route server messages until the stream ends.
async fn read_messages<R>(
    name: String,
    reader: R,
    tx: mpsc::Sender<String>,
    pending: PendingMap,
    alive: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => handle_line(&name, line.trim(), &tx, &pending).await,
            Ok(None) => {
                debug!(server = %name, "MCP server closed its output");
                break;
            }
            Err(e) => {
                warn!(server = %name, error = %e, "Failed reading from MCP server");
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
    // Dropping the senders fails every waiting request.
    pending.lock().await.clear();
}

async fn handle_line(name: &str, line: &str, tx: &mpsc::Sender<String>, pending: &PendingMap) {
    if line.is_empty() {
        return;
    }

    let message: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(_) => {
            debug!(server = %name, line, "Ignoring non-JSON output");
            return;
        }
    };

    let method = message
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let id = message.get("id").filter(|id| !id.is_null()).cloned();

    match (method.as_deref(), id) {
        // Server-initiated request: this client offers no client features.
        (Some(method), Some(id)) => {
            debug!(server = %name, method, "Rejecting server request");
            let reply = json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": METHOD_NOT_FOUND, "message": format!("Method not found: {}", method) }
            });
            let _ = tx.send(reply.to_string()).await;
        }
        (Some(method), None) => {
            debug!(server = %name, method, "Ignoring server notification");
        }
        (None, Some(id)) => {
            let Some(id) = id.as_u64() else {
                debug!(server = %name, %id, "Response with unknown id");
                return;
            };
            let waiter = pending.lock().await.remove(&id);
            match (waiter, serde_json::from_value::<RpcResponse>(message)) {
                (Some(waiter), Ok(response)) => {
                    trace!(server = %name, id, "<- response");
                    let _ = waiter.send(response);
                }
                (Some(waiter), Err(e)) => {
                    let _ = waiter.send(RpcResponse {
                        result: None,
                        error: Some(RpcError {
                            code: -32700,
                            message: format!("Malformed response: {}", e),
                        }),
                    });
                }
                (None, _) => debug!(server = %name, id, "Response to no pending request"),
            }
        }
        (None, None) => debug!(server = %name, "Ignoring message without id or method"),
    }
}

/// Relay the server's stderr into the log.
async fn forward_stderr(name: String, stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(server = %name, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, DuplexStream, ReadHalf, WriteHalf};

    type ServerLines = tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>;

    /// Client wired to an in-memory peer the test drives by hand.
    fn pair(timeout: Duration) -> (McpClient, ServerLines, WriteHalf<DuplexStream>) {
        let (client_io, server_io) = duplex(64 * 1024);
        let (client_read, client_write) = split(client_io);
        let (server_read, server_write) = split(server_io);
        let client = McpClient::from_streams("research", client_read, client_write, timeout);
        (client, BufReader::new(server_read).lines(), server_write)
    }

    async fn next_request(lines: &mut ServerLines) -> Value {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn reply(writer: &mut WriteHalf<DuplexStream>, message: Value) {
        writer
            .write_all(format!("{}\n", message).as_bytes())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let (client, mut lines, mut writer) = pair(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let init = next_request(&mut lines).await;
            assert_eq!(init["method"], "initialize");
            assert_eq!(init["params"]["protocolVersion"], PROTOCOL_VERSION);
            reply(
                &mut writer,
                json!({
                    "jsonrpc": "2.0",
                    "id": init["id"],
                    "result": {
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": {},
                        "serverInfo": { "name": "research", "version": "1.2.0" }
                    }
                }),
            )
            .await;

            let initialized = next_request(&mut lines).await;
            assert_eq!(initialized["method"], "notifications/initialized");
            assert!(initialized.get("id").is_none());
        });

        let info = client.initialize(Duration::from_secs(5)).await.unwrap();
        assert_eq!(info.name, "research");
        assert_eq!(client.server_info().unwrap().version, "1.2.0");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let (client, mut lines, mut writer) = pair(Duration::from_secs(5));

        tokio::spawn(async move {
            let first = next_request(&mut lines).await;
            assert!(first["params"].get("cursor").is_none());
            reply(
                &mut writer,
                json!({
                    "jsonrpc": "2.0", "id": first["id"],
                    "result": { "tools": [{ "name": "search_papers" }], "nextCursor": "p2" }
                }),
            )
            .await;

            let second = next_request(&mut lines).await;
            assert_eq!(second["params"]["cursor"], "p2");
            reply(
                &mut writer,
                json!({
                    "jsonrpc": "2.0", "id": second["id"],
                    "result": { "tools": [{ "name": "extract_info" }] }
                }),
            )
            .await;
        });

        let tools = client.list_tools().await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search_papers", "extract_info"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_routed_by_id() {
        let (client, mut lines, mut writer) = pair(Duration::from_secs(5));
        let client = Arc::new(client);

        tokio::spawn(async move {
            let a = next_request(&mut lines).await;
            let b = next_request(&mut lines).await;
            // Answer in reverse order.
            for req in [b, a] {
                let uri = req["params"]["uri"].as_str().unwrap().to_string();
                reply(
                    &mut writer,
                    json!({
                        "jsonrpc": "2.0", "id": req["id"],
                        "result": { "contents": [{ "uri": uri, "text": format!("body of {}", uri) }] }
                    }),
                )
                .await;
            }
        });

        let c1 = Arc::clone(&client);
        let c2 = Arc::clone(&client);
        let (r1, r2) = tokio::join!(
            async move { c1.read_resource("papers://folders").await },
            async move { c2.read_resource("papers://rust").await }
        );

        assert_eq!(r1.unwrap().contents[0].text.as_deref(), Some("body of papers://folders"));
        assert_eq!(r2.unwrap().contents[0].text.as_deref(), Some("body of papers://rust"));
    }

    #[tokio::test]
    async fn test_protocol_error() {
        let (client, mut lines, mut writer) = pair(Duration::from_secs(5));

        tokio::spawn(async move {
            let req = next_request(&mut lines).await;
            reply(
                &mut writer,
                json!({
                    "jsonrpc": "2.0", "id": req["id"],
                    "error": { "code": -32601, "message": "Method not found" }
                }),
            )
            .await;
        });

        let err = client.list_prompts().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_notifications_ignored_and_server_requests_rejected() {
        let (client, mut lines, mut writer) = pair(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let req = next_request(&mut lines).await;
            reply(
                &mut writer,
                json!({ "jsonrpc": "2.0", "method": "notifications/message", "params": {} }),
            )
            .await;
            reply(
                &mut writer,
                json!({ "jsonrpc": "2.0", "id": "srv-1", "method": "sampling/createMessage" }),
            )
            .await;

            let rejection = next_request(&mut lines).await;
            assert_eq!(rejection["id"], "srv-1");
            assert_eq!(rejection["error"]["code"], METHOD_NOT_FOUND);

            reply(
                &mut writer,
                json!({
                    "jsonrpc": "2.0", "id": req["id"],
                    "result": { "content": [{ "type": "text", "text": "ok" }] }
                }),
            )
            .await;
        });

        let result = client.call_tool("search_papers", json!({})).await.unwrap();
        assert_eq!(result.into_output("search_papers").unwrap(), "ok");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_fails_pending_and_later_requests() {
        let (client, mut lines, writer) = pair(Duration::from_secs(5));

        tokio::spawn(async move {
            let _ = next_request(&mut lines).await;
            drop(writer);
            drop(lines);
        });

        let err = client.call_tool("search_papers", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::ConnectionClosed(_)));
        assert!(!client.is_alive());

        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (client, _lines, _writer) = pair(Duration::from_millis(50));

        let err = client.call_tool("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::Timeout { .. }));
        // A timeout does not kill the connection.
        assert!(client.is_alive());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (client, _lines, _writer) = pair(Duration::from_secs(5));
        client.close().await;
        client.close().await;
        assert!(!client.is_alive());
        assert!(matches!(
            client.read_resource("papers://x").await,
            Err(McpError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_missing_command_names_server() {
        let config = ServerConfig::stdio("/nonexistent/papertrail-test-server");
        let err = McpClient::connect("research", &config).await.err().unwrap();
        assert!(matches!(err, McpError::ConnectionFailed { ref server, .. } if server == "research"));
    }
}
