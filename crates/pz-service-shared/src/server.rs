//! Listener setup.

use std::io;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Turn a `SystemConfig` bind string into something `TcpListener` accepts.
///
/// The platform hands out `:port`, which means every interface.
pub fn listen_address(bind_to: &str) -> String {
    if bind_to.starts_with(':') {
        format!("0.0.0.0{}", bind_to)
    } else {
        bind_to.to_string()
    }
}

/// Serve `router` on `bind_to` until the process exits.
pub async fn serve(bind_to: &str, router: Router) -> io::Result<()> {
    let addr = listen_address(bind_to);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router.layer(TraceLayer::new_for_http())).await
}
