//! Demo binary: run one paced sort and log its progress to the terminal.
//!
//! This is thin glue around the library. It stands in for the real
//! presentation layer by sampling dataset snapshots at a fixed tick, exactly
//! the way a renderer would, and reporting the remaining inversion count.

use std::time::{Duration, Instant};

use clap::Parser;

use sortscope::session::SortSession;
use sortscope::state::{AlgoKind, ShapeKind};

/// Execution core demo for the sorting-algorithm visualizer.
#[derive(Parser, Debug)]
#[command(name = "sortscope")]
#[command(version)]
#[command(about = "Run one paced, observable sort over a 128-value dataset", long_about = None)]
struct Args {
    /// Sorting algorithm (bubble, selection, insertion, quick, heap)
    #[arg(long, default_value = "quick", value_parser = parse_algo)]
    algo: AlgoKind,

    /// Input shape class (random, reversed, nearly-sorted, few-unique)
    #[arg(long, default_value = "random", value_parser = parse_shape)]
    shape: ShapeKind,

    /// Pacing delay after each elementary step, in microseconds
    #[arg(long, default_value_t = 500)]
    delay_us: u64,

    /// Interval between progress samples, in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Resolve an algorithm name for clap.
fn parse_algo(s: &str) -> Result<AlgoKind, String> {
    AlgoKind::ALL
        .into_iter()
        .find(|a| a.label() == s)
        .ok_or_else(|| format!("unknown algorithm {s:?}"))
}

/// Resolve a shape-class name for clap.
fn parse_shape(s: &str) -> Result<ShapeKind, String> {
    ShapeKind::ALL
        .into_iter()
        .find(|k| k.label() == s)
        .ok_or_else(|| format!("unknown shape {s:?}"))
}

/// Number of out-of-order pairs in a snapshot; zero means sorted.
fn inversions(v: &[u16]) -> usize {
    let mut count = 0;
    for i in 0..v.len() {
        for j in i + 1..v.len() {
            if v[i] > v[j] {
                count += 1;
            }
        }
    }
    count
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let session = SortSession::with_pacing(Duration::from_micros(args.delay_us));
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    session.set_completion_callback(move |data| {
        let _ = done_tx.send(data.snapshot());
    });

    tracing::info!(
        algo = args.algo.label(),
        shape = args.shape.label(),
        delay_us = args.delay_us,
        "starting sort"
    );
    let started = Instant::now();
    session.start(args.algo.id(), args.shape.id());

    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    ticker.tick().await; // first tick fires immediately
    let sorted = loop {
        tokio::select! {
            result = done_rx.recv() => break result,
            _ = ticker.tick() => {
                // Renderer-style sampling: unsynchronized best-effort read.
                let snap = session.snapshot();
                tracing::info!(inversions = inversions(&snap), "progress");
            }
        }
    };

    match sorted {
        Some(values) => {
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis(),
                sorted = session.is_sorted(),
                "sort completed"
            );
            println!("{values:?}");
        }
        None => tracing::error!("completion channel closed before the sort finished"),
    }
}
