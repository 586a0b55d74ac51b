//! Coalesces concurrent user lookups into batched "database" round trips.
//!
//! ```bash
//! RUST_LOG=ferrobatch=trace,coalesce=info cargo run --example coalesce --features async-tokio,tracing
//! ```
use anyhow::Result;
use ferrobatch::{BatchPolicy, Error, TokioBatcher};
use futures::future::join_all;
use portable_atomic::{AtomicUsize, Ordering};
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Debug, ThisError)]
#[error("user {0} not found")]
struct NotFound(u64);

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let round_trips = Arc::new(AtomicUsize::new(0));

    let users = TokioBatcher::<u64, String, NotFound>::builder(
        BatchPolicy::new(Duration::from_millis(50))
            .with_default_delay(Duration::from_millis(5))
            .with_max_count(16),
    )
    .process({
        let round_trips = Arc::clone(&round_trips);
        move |ids: Vec<u64>| {
            let round_trips = Arc::clone(&round_trips);
            async move {
                round_trips.fetch_add(1, Ordering::Relaxed);
                tracing::info!(count = ids.len(), "querying users");
                tokio::time::sleep(Duration::from_millis(20)).await;
                if let Some(&id) = ids.iter().find(|&&id| id == 13) {
                    return Err(NotFound(id));
                }
                Ok(ids.into_iter().map(|id| format!("user-{id}")).collect())
            }
        }
    })
    .prefer_single(|id: u64| async move { Ok(format!("user-{id} (cached)")) })
    .build()?;

    // Forty callers arriving over ~40ms; the size ceiling splits them.
    let callers = (0..40u64).map(|id| {
        let users = users.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(id)).await;
            (id, users.submit(id).await)
        }
    });

    for (id, result) in join_all(callers).await {
        match result {
            Ok(name) => tracing::info!(id, %name, "resolved"),
            Err(Error::Processor(err)) => tracing::warn!(id, %err, "lookup failed"),
            Err(err) => return Err(err.into()),
        }
    }

    // A lone request goes through the single-item path.
    let lone = users.submit(99).await?;
    tracing::info!(%lone, "resolved lone request");

    tracing::info!(
        round_trips = round_trips.load(Ordering::Relaxed),
        "done: 41 lookups"
    );
    Ok(())
}
