use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    chrono::Utc,
    onair_config::OnairConfig,
    onair_reconciler::{
        MessageSink, PollDriver, Presence, Reconciler, Renderer, RetryPolicy, Settings,
        SnapshotSource,
    },
    onair_telegram::TelegramSink,
    onair_twitch::HelixClient,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::check_commands::load_validated;

fn settings(config: &OnairConfig) -> Settings {
    Settings {
        resource: config.twitch.streamer.clone(),
        display: config.display.clone(),
        retry: RetryPolicy::from_config(&config.reconciler),
        deletion_delay: config.reconciler.deletion_delay(),
    }
}

pub async fn run(explicit: Option<&Path>) -> Result<()> {
    let config = load_validated(explicit)?;

    let source = HelixClient::new(&config.twitch).context("building twitch client")?;
    let sink = TelegramSink::new(&config.telegram).context("building telegram client")?;
    sink.verify().await.context("telegram token check failed")?;

    let reconciler = Reconciler::new(
        settings(&config),
        Arc::new(source) as Arc<dyn SnapshotSource>,
        Arc::new(sink) as Arc<dyn MessageSink>,
    );

    let cancel = CancellationToken::new();
    let driver = PollDriver::spawn(
        Arc::clone(&reconciler),
        config.reconciler.poll_interval(),
        cancel.clone(),
    );

    shutdown_signal().await;
    cancel.cancel();
    driver.await.context("poll driver panicked")?;

    let status = reconciler.status().await;
    info!(
        phase = %status.phase,
        message_id = ?status.message_id,
        "shutdown complete"
    );
    Ok(())
}

/// Print what the post would look like right now.
pub async fn preview(explicit: Option<&Path>) -> Result<()> {
    let config = load_validated(explicit)?;
    let source = HelixClient::new(&config.twitch).context("building twitch client")?;

    let Some(snapshot) = source
        .stream(&config.twitch.streamer)
        .await
        .context("querying twitch")?
    else {
        println!("{} is offline.", config.twitch.streamer);
        return Ok(());
    };

    let renderer = Renderer::new(config.display.clone(), config.twitch.streamer.clone());
    let content = renderer.render(&snapshot, Presence::Live, Utc::now());
    println!("media: {}\n", content.media);
    println!("{}\n", content.caption);
    for row in content.buttons.iter().flatten() {
        for button in row {
            println!("[{}] {}", button.label, button.url);
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        },
        () = terminate() => {
            info!("received SIGTERM, shutting down");
        },
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        },
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        },
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
