//! tributary - notification を手元のディレクトリに対して再生する
//!
//! 1 行 1 通知の body ファイルを InMemoryQueue に積み、LocalObjectLoader で
//! `--root` 以下の object を読み込む。全て処理し終えたら close してサマリを出す。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tributary_core::impls::{InMemoryQueue, LocalObjectLoader, MemoryMonitor};
use tributary_core::ports::{MessageQueue, QueueMessage};
use tributary_core::{IngressBuilder, IngressConfig};

#[derive(Debug, Parser)]
#[command(name = "tributary", about = "Replay object-store notifications against a local object root")]
struct Cli {
    /// Directory standing in for the object store (`s3://bucket/key` → `<root>/bucket/key`)
    #[arg(long)]
    root: PathBuf,

    /// File with one notification body per line
    #[arg(long)]
    notifications: PathBuf,

    /// JSON file with an IngressConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override max_concurrency
    #[arg(long)]
    concurrency: Option<usize>,

    /// Give up waiting for the drain after this many milliseconds
    #[arg(long, default_value_t = 30_000)]
    linger_ms: u64,
}

fn load_config(path: &Path) -> Result<IngressConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => IngressConfig::default(),
    };
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrency = concurrency;
    }

    // (A) 通知を InMemoryQueue に積む
    let raw = std::fs::read_to_string(&cli.notifications)
        .with_context(|| format!("reading notifications {}", cli.notifications.display()))?;
    let bodies: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let queue = Arc::new(InMemoryQueue::new(bodies.len()));
    for (i, body) in bodies.iter().enumerate() {
        let message =
            QueueMessage::new(format!("receipt-{i}"), *body).with_message_id(format!("message-{i}"));
        queue.push(message).await?;
    }
    info!(messages = bodies.len(), "notifications queued");

    // (B) Ingress を組み立てて start
    let monitor = Arc::new(MemoryMonitor::new());
    let ingress = IngressBuilder::new()
        .config(config)
        .queue(queue.clone())
        .loader(Arc::new(LocalObjectLoader::new(&cli.root)))
        .monitor(monitor.clone())
        .build()?;

    let handled = Arc::new(AtomicUsize::new(0));
    let bytes = Arc::new(AtomicUsize::new(0));
    ingress.start({
        let handled = handled.clone();
        let bytes = bytes.clone();
        move |payload: Vec<u8>| {
            info!(bytes = payload.len(), "payload received");
            handled.fetch_add(1, Ordering::Relaxed);
            bytes.fetch_add(payload.len(), Ordering::Relaxed);
            false
        }
    });

    // (C) 積んだ分を読み切ったら stream を閉じ、drain と fetch が終わるのを待つ
    queue.close().await?;
    let drained = async {
        while !ingress.status().is_idle() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    tokio::select! {
        result = tokio::time::timeout(Duration::from_millis(cli.linger_ms), drained) => {
            if result.is_err() {
                warn!(linger_ms = cli.linger_ms, "drain did not finish in time; closing");
            }
        }
        _ = tokio::signal::ctrl_c() => info!("interrupted; closing"),
    }

    // (D) close してサマリを出す
    ingress.close().await;
    let summary = serde_json::json!({
        "status": ingress.status(),
        "handled": handled.load(Ordering::Relaxed),
        "bytes": bytes.load(Ordering::Relaxed),
        "monitor": monitor.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
