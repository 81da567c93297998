//! Messages exchanged with the parent process.
//!
//! The dev server usually runs inside a worker spawned by the host
//! application. Once the server is valid the worker tells its parent which
//! port it landed on, and answers later port queries with the same message.
//!
//! Transports:
//! - [`ProcessChannel::detached`]: no parent, sends are dropped
//! - [`ProcessChannel::connect`]: newline-delimited JSON over any async pipe
//! - [`ProcessChannel::linked`]: in-process pair, the parent side is a
//!   [`ParentLink`]

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Recipient tag of the ready message.
pub const APP_RECIPIENT: &str = "app";

const INBOUND_CAPACITY: usize = 64;

/// Wire message, tagged on `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum IpcMessage {
    /// `{ "action": "webpack-server-ready", "to": "app", "data": { "port": .. } }`
    WebpackServerReady { to: String, data: ReadyData },
    /// `{ "action": "ask-for-webpack-server-port" }`
    AskForWebpackServerPort,
    /// Any action this side does not handle
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyData {
    pub port: u16,
}

impl IpcMessage {
    pub fn server_ready(port: u16) -> Self {
        IpcMessage::WebpackServerReady {
            to: APP_RECIPIENT.to_string(),
            data: ReadyData { port },
        }
    }
}

/// The owning process's link to its parent.
#[derive(Debug, Clone)]
pub struct ProcessChannel {
    outbound: Option<mpsc::UnboundedSender<IpcMessage>>,
    inbound: broadcast::Sender<IpcMessage>,
}

impl ProcessChannel {
    /// No parent process.
    pub fn detached() -> Self {
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        Self {
            outbound: None,
            inbound,
        }
    }

    /// Newline-delimited JSON over `reader`/`writer`.
    ///
    /// Spawns the pump tasks, so it must be called inside a Tokio runtime.
    /// Lines that do not parse as a message are skipped.
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<IpcMessage>();
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);

        let mut writer = writer;
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let mut line = match serde_json::to_string(&msg) {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("failed to encode parent message: {}", err);
                        continue;
                    }
                };
                line.push('\n');
                if let Err(err) = writer.write_all(line.as_bytes()).await {
                    warn!("parent channel closed: {}", err);
                    break;
                }
                if let Err(err) = writer.flush().await {
                    warn!("parent channel closed: {}", err);
                    break;
                }
            }
        });

        let inbound_tx = inbound.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match serde_json::from_str::<IpcMessage>(&line) {
                        // no subscriber yet is fine
                        Ok(msg) => {
                            let _ = inbound_tx.send(msg);
                        }
                        Err(err) => debug!(%line, "ignoring parent line: {}", err),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        warn!("parent channel read error: {}", err);
                        break;
                    }
                }
            }
            debug!("parent channel reader finished");
        });

        Self {
            outbound: Some(out_tx),
            inbound,
        }
    }

    /// Parent on the other end of stdin/stdout.
    ///
    /// Stdout then belongs to the channel: nothing else in the process may
    /// print to it. The logger and the entry box write to stderr.
    pub fn stdio() -> Self {
        Self::connect(tokio::io::stdin(), tokio::io::stdout())
    }

    /// In-process pair: the channel for the server owner and the parent's end.
    pub fn linked() -> (Self, ParentLink) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        let link = ParentLink {
            from_child: out_rx,
            to_child: inbound.clone(),
        };
        let channel = Self {
            outbound: Some(out_tx),
            inbound,
        };
        (channel, link)
    }

    pub fn has_parent(&self) -> bool {
        self.outbound.is_some()
    }

    /// Send to the parent. Returns whether the message was handed off.
    pub fn send(&self, msg: IpcMessage) -> bool {
        match &self.outbound {
            Some(tx) => match tx.send(msg) {
                Ok(()) => true,
                Err(_) => {
                    debug!("parent channel gone, message dropped");
                    false
                }
            },
            None => false,
        }
    }

    /// Receive every inbound message from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<IpcMessage> {
        self.inbound.subscribe()
    }
}

/// The parent's end of [`ProcessChannel::linked`].
#[derive(Debug)]
pub struct ParentLink {
    from_child: mpsc::UnboundedReceiver<IpcMessage>,
    to_child: broadcast::Sender<IpcMessage>,
}

impl ParentLink {
    /// Next message from the child; `None` once every child handle is gone.
    pub async fn recv(&mut self) -> Option<IpcMessage> {
        self.from_child.recv().await
    }

    pub fn try_recv(&mut self) -> Option<IpcMessage> {
        self.from_child.try_recv().ok()
    }

    /// Deliver to the child's subscribers. Returns how many received it.
    pub fn send(&self, msg: IpcMessage) -> usize {
        self.to_child.send(msg).unwrap_or(0)
    }
}
