//! Running the blocking HTTP client from async callers.
//!
//! `reqwest::blocking` panics when it is driven from a thread that is
//! executing a tokio runtime. Everything in this crate that talks HTTP goes
//! through [`run_blocking`], so sinks and bootstrap helpers can be called
//! from plain threads and from async tasks alike.

use std::panic;
use std::thread;

use tokio::runtime::{Handle, RuntimeFlavor};

/// Run `f` where blocking is allowed.
///
/// - outside a runtime: inline
/// - on a multi-threaded runtime worker: inside `block_in_place`
/// - on a current-thread runtime: on a short-lived scoped thread
pub(crate) fn run_blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    let Ok(handle) = Handle::try_current() else {
        return f();
    };

    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => thread::scope(|scope| match scope.spawn(f).join() {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }),
    }
}
