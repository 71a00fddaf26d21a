//! Shared HTTP harness for pz microservices.
//!
//! - [`ServiceResponse`]: axum response over the common JSON envelope
//! - [`health_check`]: the `GET /` handler every service exposes
//! - [`logging`]: tracing subscriber setup
//! - [`serve`]: bind a router to a `SystemConfig` listen address
//!
//! Handlers stay thin; record handling and bootstrap live in `pz-common`.

mod health;
pub mod logging;
mod response;
mod server;

pub use health::{health_check, HEALTH_MESSAGE};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use response::ServiceResponse;
pub use server::{listen_address, serve};
