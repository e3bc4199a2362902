use tracing::info;

use staffline::config::Config;
use staffline::notify::{
    Notification, NotificationStream, StreamState, SubscriberKey, TcpLineTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    staffline::observability::init(config.metrics_port);

    let key = SubscriberKey::new(config.subscriber.clone())?;
    let transport = TcpLineTransport::new(config.endpoint.clone(), config.path.clone());
    let stream = NotificationStream::spawn(transport, config.stream_config());

    info!("staffline tailing notifications from {}{}", config.endpoint, config.path);
    info!("  subscriber: {key}");
    info!(
        "  reconnect: {} attempts, base delay {:?}",
        config.max_reconnects, config.reconnect_base
    );

    stream.add_listener("log", |n: &Notification| {
        info!(kind = ?n.kind(), "{}: {}", n.title(), n.summary());
    });
    stream.connect(key)?;

    // Graceful shutdown on SIGTERM/ctrl-c; report when retries run out.
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    let mut state = stream.subscribe_state();
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                if let StreamState::Exhausted { key } = &*state.borrow_and_update() {
                    tracing::error!("stream for {key} is disconnected; restart to retry");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    stream.shutdown().await?;
    info!("shutdown complete");
    Ok(())
}
