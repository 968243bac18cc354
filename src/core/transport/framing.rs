//! Newline-delimited JSON-RPC framing for MCP sessions.
//!
//! Frames are read as raw bytes and decoded with serde, so a frame that is
//! not UTF-8, not JSON or not a JSON-RPC message is answered with an error
//! response and the session keeps reading. Outbound frames funnel through a
//! single writer task so they never interleave.

use rmcp::RoleServer;
use rmcp::model::ErrorCode;
use rmcp::service::{RxJsonRpcMessage, TxJsonRpcMessage};
use rmcp::transport::Transport;
use serde_json::{Value, json};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Request methods this server answers.
const SERVED_METHODS: [&str; 6] = [
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/read",
];

/// Server side of one newline-delimited JSON-RPC session.
///
/// Must be created from within a Tokio runtime.
pub struct LineTransport<R> {
    reader: BufReader<R>,
    frame: Vec<u8>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl<R> LineTransport<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new<W>(reader: R, writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, inbox) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            if let Err(e) = write_frames(writer, inbox).await {
                warn!("Failed to write to peer: {}", e);
            }
        });

        Self {
            reader: BufReader::new(reader),
            frame: Vec::new(),
            outbound,
        }
    }

    fn enqueue(&self, frame: Vec<u8>) -> io::Result<()> {
        self.outbound
            .send(frame)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "session writer is gone"))
    }

    fn reject(&self, id: Value, code: ErrorCode, message: String) {
        let response = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code.0, "message": message },
        });
        if self.enqueue(response.to_string().into_bytes()).is_err() {
            debug!("Session closed before the error was written");
        }
    }

    /// Decode one frame. Frames that cannot be decoded are answered here
    /// when JSON-RPC calls for an answer, and yield `None`.
    fn decode(&self, frame: &[u8]) -> Option<RxJsonRpcMessage<RoleServer>> {
        let value: Value = match serde_json::from_slice(frame) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON-RPC frame: {}", e);
                self.reject(Value::Null, ErrorCode::PARSE_ERROR, format!("Parse error: {e}"));
                return None;
            }
        };

        let id = value.get("id").cloned();
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);

        let err = match serde_json::from_value(value) {
            Ok(message) => return Some(message),
            Err(e) => e,
        };
        warn!("Invalid JSON-RPC message: {}", err);

        match (id, method) {
            (Some(id), Some(method)) if SERVED_METHODS.contains(&method.as_str()) => self.reject(
                id,
                ErrorCode::INVALID_PARAMS,
                format!("Invalid params for '{method}': {err}"),
            ),
            (Some(id), Some(method)) => self.reject(
                id,
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
            // Notifications and responses never get an answer.
            (_, Some(_)) | (Some(_), None) => {}
            (None, None) => self.reject(
                Value::Null,
                ErrorCode::INVALID_REQUEST,
                format!("Invalid request: {err}"),
            ),
        }
        None
    }
}

impl<R> Transport<RoleServer> for LineTransport<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    type Error = io::Error;

    fn send(
        &mut self,
        item: TxJsonRpcMessage<RoleServer>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let result = serde_json::to_vec(&item)
            .map_err(io::Error::other)
            .and_then(|frame| self.enqueue(frame));
        std::future::ready(result)
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleServer>> {
        loop {
            self.frame.clear();
            match self.reader.read_until(b'\n', &mut self.frame).await {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read from peer: {}", e);
                    return None;
                }
            }

            let frame = self.frame.trim_ascii();
            if frame.is_empty() {
                continue;
            }
            trace!("<- {}", String::from_utf8_lossy(frame));
            if let Some(message) = self.decode(frame) {
                return Some(message);
            }
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

async fn write_frames<W>(mut writer: W, mut inbox: mpsc::UnboundedReceiver<Vec<u8>>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut frame) = inbox.recv().await {
        trace!("-> {}", String::from_utf8_lossy(&frame));
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}
