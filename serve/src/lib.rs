//! WebSocket server for databot (axum + ws).
//!
//! Listens on ws://127.0.0.1:8764 by default. One WebSocket connection is one chat session:
//! the bot greets on connect, then handles `user_message`, `reset` and `ping` requests.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod connection;
mod response;

use std::sync::Arc;

use databot::OpenDataBot;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use app::{router, AppState};

pub const DEFAULT_WS_ADDR: &str = "127.0.0.1:8764";

/// Runs the WebSocket server on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass listener).
/// When `once` is true, accepts one connection, handles it, then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    bot: Arc<OpenDataBot>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("WebSocket server listening on ws://{}", addr);
    if once {
        info!("will exit after first connection is done (once mode, used by tests)");
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = Arc::new(AppState {
        shutdown_tx: Arc::new(std::sync::Mutex::new(if once {
            Some(shutdown_tx)
        } else {
            None
        })),
        bot,
    });

    let app = router(state);

    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the WebSocket server. Listens on `addr` (default 127.0.0.1:8764).
/// When `once` is true, accepts one connection, handles it, then returns (process exits).
pub async fn run_serve(
    addr: Option<&str>,
    bot: Arc<OpenDataBot>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_WS_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, bot, once).await
}
