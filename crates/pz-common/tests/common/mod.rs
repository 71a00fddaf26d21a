//! Shared helpers for integration tests.
//!
//! The library's HTTP clients are blocking, so stub services run on their own
//! thread with a private tokio runtime and the tests themselves stay
//! synchronous.

use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use axum::Router;
use pz_common::vcap::PlatformEnv;
use pz_common::ServiceName;
use tokio::sync::oneshot;

/// An HTTP stub serving a router on an ephemeral local port.
///
/// Dropping the stub shuts it down and waits until the port is released.
pub struct StubServer {
    address: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        listener.set_nonblocking(true).expect("set nonblocking");
        let address = listener.local_addr().expect("stub address");
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build stub runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("adopt stub listener");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = signal.await;
                    })
                    .await
                    .expect("serve stub");
            });
        });

        Self {
            address,
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    /// `host:port` form, as stored in the service directory.
    #[allow(dead_code)]
    pub fn address(&self) -> String {
        self.address.to_string()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A blocking HTTP client built on a plain thread, for async tests.
///
/// Constructing the client waits on its worker thread, which panics on a
/// runtime thread.
#[allow(dead_code)]
pub fn client_off_runtime() -> reqwest::blocking::Client {
    thread::spawn(reqwest::blocking::Client::new)
        .join()
        .expect("build blocking client")
}

/// A local address nothing is listening on.
#[allow(dead_code)]
pub fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind scratch listener");
    let address = listener.local_addr().expect("scratch address");
    drop(listener);
    address.to_string()
}

/// Platform environment binding each service to the given address.
#[allow(dead_code)]
pub fn env_with_services(bindings: &[(ServiceName, String)]) -> PlatformEnv {
    let services: Vec<serde_json::Value> = bindings
        .iter()
        .map(|(name, host)| {
            serde_json::json!({
                "name": name.as_str(),
                "label": "user-provided",
                "credentials": { "host": host },
                "tags": []
            })
        })
        .collect();

    PlatformEnv::builder()
        .services(serde_json::json!({ "user-provided": services }).to_string())
        .build()
}
