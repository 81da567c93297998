//! Dev server lifecycle against an in-memory bundler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use devhost::dev::{
    Bundler, BundlerSession, CompilationResult, CompileStatus, DevServerManager, LiveServer,
    ServerSlot,
};
use devhost::dump::RuntimeState;
use devhost::error::{DevError, Result};
use devhost::ipc::{IpcMessage, ParentLink, ProcessChannel};
use devhost_config::{ConfigValue, ResolvedConfig};
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing_test::traced_test;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Counters {
    serves: AtomicUsize,
    closes: AtomicUsize,
}

struct FakeServer {
    counters: Arc<Counters>,
    bound: Arc<Mutex<Option<SocketAddr>>>,
    fail_listen: bool,
    hang_listen: bool,
}

#[async_trait]
impl LiveServer for FakeServer {
    async fn listen(&self, addr: SocketAddr) -> std::io::Result<()> {
        if self.hang_listen {
            std::future::pending::<()>().await;
        }
        if self.fail_listen {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address already in use",
            ));
        }
        *self.bound.lock() = Some(addr);
        Ok(())
    }

    async fn close(&self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out sessions whose compilations the test drives by hand.
#[derive(Default)]
struct FakeBundler {
    counters: Arc<Counters>,
    bound: Arc<Mutex<Option<SocketAddr>>>,
    compiler: Mutex<Option<mpsc::UnboundedSender<CompilationResult>>>,
    fail_listen: bool,
    hang_listen: bool,
}

impl FakeBundler {
    fn failing_listen() -> Self {
        Self {
            fail_listen: true,
            ..Self::default()
        }
    }

    fn hanging_listen() -> Self {
        Self {
            hang_listen: true,
            ..Self::default()
        }
    }

    /// Finish a compilation on the latest session. Dropped if its watcher
    /// is gone.
    fn compile(&self, result: CompilationResult) {
        if let Some(tx) = self.compiler.lock().as_ref() {
            let _ = tx.send(result);
        }
    }

    fn serves(&self) -> usize {
        self.counters.serves.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

impl Bundler for FakeBundler {
    fn serve(&self, _config: &ResolvedConfig) -> Result<BundlerSession> {
        self.counters.serves.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        *self.compiler.lock() = Some(tx);
        Ok(BundlerSession {
            compilations: rx,
            server: Box::new(FakeServer {
                counters: Arc::clone(&self.counters),
                bound: Arc::clone(&self.bound),
                fail_listen: self.fail_listen,
                hang_listen: self.hang_listen,
            }),
        })
    }
}

fn config(port: u16) -> ResolvedConfig {
    let tree = ConfigValue::from_json(json!({
        "entry": { "home": "client/home/index.jsx" },
        "output": { "publicPath": "/build/" },
        "devServer": { "port": port }
    }))
    .unwrap();
    ResolvedConfig::enforce(tree, port).unwrap().0
}

fn runtime(dir: &TempDir) -> RuntimeState {
    RuntimeState {
        rundir: dir.path().join("run"),
        env: "unittest".to_string(),
    }
}

fn manager(bundler: &Arc<FakeBundler>, channel: ProcessChannel, dir: &TempDir) -> DevServerManager {
    let bundler: Arc<dyn Bundler> = bundler.clone();
    DevServerManager::new(bundler, channel, runtime(dir))
}

async fn next_message(parent: &mut ParentLink) -> IpcMessage {
    timeout(WAIT, parent.recv())
        .await
        .expect("timed out waiting for the child")
        .expect("child channel closed")
}

async fn next_line<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> String {
    timeout(WAIT, lines.next_line())
        .await
        .expect("timed out waiting for the child")
        .unwrap()
        .expect("child pipe closed")
}

async fn wait_for_status(manager: &DevServerManager, wanted: impl Fn(&CompileStatus) -> bool) {
    timeout(WAIT, async {
        while !wanted(&manager.status()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for compile status");
}

#[tokio::test]
async fn ready_is_sent_once_the_first_compile_settles() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7001), 7001).await.unwrap();

    assert!(slot.is_running());
    assert_eq!(slot.port(), Some(7001));
    assert_eq!(*bundler.bound.lock(), Some("0.0.0.0:7001".parse().unwrap()));
    assert!(parent.try_recv().is_none());

    bundler.compile(CompilationResult::success());
    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7001));
    assert!(manager.status().is_success());

    let dumped = dir.path().join("run/webpack.unittest.json");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dumped).unwrap()).unwrap();
    assert_eq!(written["devServer"]["port"], json!(7001));
    assert_eq!(written["devServer"]["contentBase"], json!(false));
}

#[tokio::test]
async fn failed_first_compile_still_becomes_valid() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7002), 7002).await.unwrap();
    bundler.compile(CompilationResult::failed(["Module not found"]));

    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7002));
    assert_eq!(
        manager.status(),
        CompileStatus::Failed {
            errors: vec!["Module not found".to_string()]
        }
    );
}

#[tokio::test]
async fn second_start_on_same_slot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let manager = manager(&bundler, ProcessChannel::detached(), &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7003), 7003).await.unwrap();
    let err = manager.start(&mut slot, &config(7004), 7004).await.unwrap_err();

    assert!(matches!(err, DevError::MultiInstance));
    assert_eq!(err.to_string(), "Multi webpack dev server instance found");
    assert_eq!(bundler.serves(), 1);
    assert_eq!(slot.port(), Some(7003));
}

#[tokio::test]
async fn close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let manager = manager(&bundler, ProcessChannel::detached(), &dir);
    let mut slot = ServerSlot::new();

    // empty slot
    manager.close(&mut slot).await;
    assert_eq!(bundler.closes(), 0);

    manager.start(&mut slot, &config(7005), 7005).await.unwrap();
    manager.close(&mut slot).await;
    manager.close(&mut slot).await;

    assert!(!slot.is_running());
    assert_eq!(bundler.closes(), 1);
}

#[tokio::test]
#[traced_test]
async fn restart_leaves_a_single_port_responder() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7006), 7006).await.unwrap();
    bundler.compile(CompilationResult::success());
    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7006));

    manager.restart(&mut slot, &config(7007), 7007).await.unwrap();
    assert_eq!(bundler.closes(), 1);
    assert_eq!(bundler.serves(), 2);
    assert!(logs_contain("auto restart"));

    bundler.compile(CompilationResult::success());
    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7007));

    parent.send(IpcMessage::AskForWebpackServerPort);
    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7007));
    // the handler of the closed server is gone
    assert!(
        timeout(Duration::from_millis(200), parent.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn unrelated_parent_messages_are_ignored() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7008), 7008).await.unwrap();
    bundler.compile(CompilationResult::success());
    next_message(&mut parent).await;

    parent.send(IpcMessage::Other);
    parent.send(IpcMessage::AskForWebpackServerPort);
    assert_eq!(next_message(&mut parent).await, IpcMessage::server_ready(7008));
    assert!(parent.try_recv().is_none());
}

#[tokio::test]
#[traced_test]
async fn listen_failure_is_logged_not_returned() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::failing_listen());
    let manager = manager(&bundler, ProcessChannel::detached(), &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7009), 7009).await.unwrap();

    assert!(slot.is_running());
    assert!(logs_contain("dev server failed to listen"));
    assert!(logs_contain("address already in use"));
    // the config is still dumped
    assert!(dir.path().join("run/webpack.unittest.json").exists());
}

#[tokio::test]
#[traced_test]
async fn dump_failure_does_not_stop_the_server() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("run"), "a file where the run dir should be").unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let manager = manager(&bundler, ProcessChannel::detached(), &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7010), 7010).await.unwrap();

    assert!(slot.is_running());
    assert!(logs_contain("dumpConfig error"));
}

#[tokio::test]
#[traced_test]
async fn compile_done_is_logged_on_recovery_only() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7011), 7011).await.unwrap();

    bundler.compile(CompilationResult::success());
    next_message(&mut parent).await;
    bundler.compile(CompilationResult::success());
    bundler.compile(CompilationResult::failed(["Unexpected token"]));
    wait_for_status(&manager, |s| matches!(s, CompileStatus::Failed { .. })).await;
    bundler.compile(CompilationResult::success());
    wait_for_status(&manager, CompileStatus::is_success).await;

    logs_assert(|lines: &[&str]| {
        match lines.iter().filter(|line| line.contains("compile done")).count() {
            2 => Ok(()),
            n => Err(format!("expected 2 compile done lines, got {}", n)),
        }
    });
}

#[tokio::test]
async fn close_resets_compile_status() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::default());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7012), 7012).await.unwrap();
    bundler.compile(CompilationResult::success());
    next_message(&mut parent).await;
    assert!(manager.status().is_success());

    manager.close(&mut slot).await;
    assert_eq!(manager.status(), CompileStatus::Pending);

    // a late result from the closed compiler changes nothing
    bundler.compile(CompilationResult::failed(["stale"]));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.status(), CompileStatus::Pending);
}

#[tokio::test]
async fn abandoned_start_leaves_no_port_responder() {
    let dir = TempDir::new().unwrap();
    let bundler = Arc::new(FakeBundler::hanging_listen());
    let (channel, mut parent) = ProcessChannel::linked();
    let manager = manager(&bundler, channel, &dir);
    let mut slot = ServerSlot::new();

    let started = timeout(
        Duration::from_millis(50),
        manager.start(&mut slot, &config(7013), 7013),
    )
    .await;
    assert!(started.is_err());
    assert!(!slot.is_running());

    bundler.compile(CompilationResult::success());
    parent.send(IpcMessage::AskForWebpackServerPort);
    assert!(
        timeout(Duration::from_millis(200), parent.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn parent_pipe_carries_only_json_lines() {
    let dir = TempDir::new().unwrap();
    let (child_end, parent_end) = tokio::io::duplex(4096);
    let (child_read, child_write) = tokio::io::split(child_end);
    let (parent_read, mut parent_write) = tokio::io::split(parent_end);

    let bundler = Arc::new(FakeBundler::default());
    let manager = manager(&bundler, ProcessChannel::connect(child_read, child_write), &dir);
    let mut slot = ServerSlot::new();

    manager.start(&mut slot, &config(7014), 7014).await.unwrap();
    bundler.compile(CompilationResult::success());

    let mut lines = BufReader::new(parent_read).lines();

    // the entry box is announced right before the ready message
    let first = next_line(&mut lines).await;
    assert_eq!(
        serde_json::from_str::<IpcMessage>(&first).unwrap(),
        IpcMessage::server_ready(7014)
    );

    parent_write
        .write_all(b"{\"action\":\"ask-for-webpack-server-port\"}\n")
        .await
        .unwrap();
    let second = next_line(&mut lines).await;
    assert_eq!(
        serde_json::from_str::<IpcMessage>(&second).unwrap(),
        IpcMessage::server_ready(7014)
    );
}
