//! Server lifecycle: start, close, restart.
//!
//! Stopped → Starting → Running → Stopped. The running server lives in a
//! [`ServerSlot`] owned by the caller; at most one server per slot.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use devhost_config::{EntryMap, ResolvedConfig};
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info};

use super::bundler::{Bundler, CompilationResult, LiveServer};
use crate::dump::{RuntimeState, dump_config};
use crate::error::{DevError, Result};
use crate::ipc::{IpcMessage, ProcessChannel};
use crate::ui;

/// Latest compilation state of the running server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompileStatus {
    /// No compilation has finished yet
    #[default]
    Pending,
    Success,
    Failed { errors: Vec<String> },
}

impl CompileStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileStatus::Success)
    }
}

pub type SharedStatus = Arc<RwLock<CompileStatus>>;

/// Aborts the server's background tasks when dropped.
struct TaskGuard(Vec<JoinHandle<()>>);

impl TaskGuard {
    /// Abort every task and wait until none of them can run again.
    async fn shutdown(mut self) {
        for task in std::mem::take(&mut self.0) {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

struct RunningServer {
    server: Box<dyn LiveServer>,
    port: u16,
    tasks: TaskGuard,
}

/// Holds at most one running dev server.
#[derive(Default)]
pub struct ServerSlot {
    running: Option<RunningServer>,
}

impl ServerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Port of the running server.
    pub fn port(&self) -> Option<u16> {
        self.running.as_ref().map(|r| r.port)
    }
}

impl std::fmt::Debug for ServerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSlot")
            .field("port", &self.port())
            .finish()
    }
}

/// Drives the bundler's dev server for one owner process.
pub struct DevServerManager {
    bundler: Arc<dyn Bundler>,
    channel: ProcessChannel,
    runtime: RuntimeState,
    status: SharedStatus,
}

impl DevServerManager {
    pub fn new(bundler: Arc<dyn Bundler>, channel: ProcessChannel, runtime: RuntimeState) -> Self {
        Self {
            bundler,
            channel,
            runtime,
            status: Arc::new(RwLock::new(CompileStatus::Pending)),
        }
    }

    pub fn status(&self) -> CompileStatus {
        self.status.read().clone()
    }

    /// Start a dev server on `port` and park it in `slot`.
    ///
    /// A bind failure is logged, not returned: the slot still holds the
    /// server so a later `close`/`restart` cleans it up.
    ///
    /// # Errors
    ///
    /// [`DevError::MultiInstance`] if `slot` is occupied, or whatever the
    /// bundler returns when it cannot create a session.
    pub async fn start(
        &self,
        slot: &mut ServerSlot,
        config: &ResolvedConfig,
        port: u16,
    ) -> Result<()> {
        if slot.is_running() {
            return Err(DevError::MultiInstance);
        }

        debug!(port, "starting dev server");
        let session = self.bundler.serve(config)?;
        *self.status.write() = CompileStatus::Pending;

        let (valid_tx, valid_rx) = oneshot::channel();
        let watcher = tokio::spawn(
            watch_compilations(session.compilations, valid_tx, Arc::clone(&self.status))
                .in_current_span(),
        );
        let notifier = tokio::spawn(
            notify_parent(valid_rx, self.channel.clone(), config.entry.clone(), port)
                .in_current_span(),
        );
        // guarded before the first await: a dropped `start` takes the tasks with it
        let tasks = TaskGuard(vec![watcher, notifier]);

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        if let Err(err) = session.server.listen(addr).await {
            error!(port, "dev server failed to listen: {}", err);
        }

        slot.running = Some(RunningServer {
            server: session.server,
            port,
            tasks,
        });

        dump_config(&self.runtime, config);
        Ok(())
    }

    /// Stop the server in `slot`, if any. Idempotent.
    ///
    /// The compile status goes back to [`CompileStatus::Pending`].
    pub async fn close(&self, slot: &mut ServerSlot) {
        let Some(running) = slot.running.take() else {
            return;
        };
        running.server.close().await;
        running.tasks.shutdown().await;
        *self.status.write() = CompileStatus::Pending;
        debug!(port = running.port, "dev server closed");
    }

    pub async fn restart(
        &self,
        slot: &mut ServerSlot,
        config: &ResolvedConfig,
        port: u16,
    ) -> Result<()> {
        info!("auto restart");
        self.close(slot).await;
        self.start(slot, config, port).await
    }
}

async fn watch_compilations(
    mut compilations: mpsc::UnboundedReceiver<CompilationResult>,
    valid: oneshot::Sender<()>,
    status: SharedStatus,
) {
    let mut valid = Some(valid);
    let mut last_ok = false;

    while let Some(result) = compilations.recv().await {
        let ok = result.is_ok();
        if ok && !last_ok {
            info!("compile done");
        }
        last_ok = ok;

        *status.write() = if ok {
            CompileStatus::Success
        } else {
            CompileStatus::Failed {
                errors: result.errors,
            }
        };

        if let Some(tx) = valid.take() {
            let _ = tx.send(());
        }
    }
}

async fn notify_parent(
    valid: oneshot::Receiver<()>,
    channel: ProcessChannel,
    entry: EntryMap,
    port: u16,
) {
    if valid.await.is_err() {
        debug!("compiler went away before the server became valid");
        return;
    }

    info!(port, "dev server listening on port {}", port);
    ui::announce_entry(&entry);

    let mut requests = channel.subscribe();
    channel.send(IpcMessage::server_ready(port));

    loop {
        match requests.recv().await {
            Ok(IpcMessage::AskForWebpackServerPort) => {
                debug!(port, "parent asked for the dev server port");
                channel.send(IpcMessage::server_ready(port));
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "parent messages skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
