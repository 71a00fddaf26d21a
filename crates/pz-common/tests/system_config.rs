mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use pz_common::{Error, PlatformEnv, ServiceName, SystemConfig};

use common::{env_with_services, unused_address, StubServer};

fn healthy() -> Router {
    Router::new().route("/", get(|| async { "Hi" }))
}

#[test]
fn startup_fails_when_dependency_is_unhealthy() {
    let logger = StubServer::spawn(Router::new().route(
        "/",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    ));
    let env = env_with_services(&[(ServiceName::Logger, logger.address())]);

    let err = SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env)
        .expect_err("unhealthy logger must abort startup");

    match &err {
        Error::StartupHealth { service, .. } => assert_eq!(*service, ServiceName::Logger),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("pz-logger"));
}

#[test]
fn startup_fails_when_dependency_is_unreachable() {
    let env = env_with_services(&[(ServiceName::Uuidgen, unused_address())]);

    let err = SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Uuidgen], &env)
        .expect_err("unreachable dependency must abort startup");
    assert!(matches!(
        err,
        Error::StartupHealth {
            service: ServiceName::Uuidgen,
            ..
        }
    ));
}

#[test]
fn startup_succeeds_with_healthy_dependencies() {
    let logger = StubServer::spawn(healthy());
    let uuidgen = StubServer::spawn(healthy());
    let env = env_with_services(&[
        (ServiceName::Logger, logger.address()),
        (ServiceName::Uuidgen, uuidgen.address()),
    ]);

    let config = SystemConfig::with_env(
        ServiceName::Workflow,
        &[ServiceName::Logger, ServiceName::Uuidgen, ServiceName::Workflow],
        &env,
    )
    .expect("healthy dependencies");

    assert_eq!(config.address_of(ServiceName::Logger).unwrap(), logger.address());
    assert_eq!(config.url_of(ServiceName::Uuidgen).unwrap(), uuidgen.url());
    assert_eq!(config.address_of(ServiceName::Workflow).unwrap(), config.address());
}

#[test]
fn wait_for_service_returns_once_healthy() {
    let logger = StubServer::spawn(healthy());
    let env = env_with_services(&[(ServiceName::Logger, logger.address())]);
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env).unwrap();

    config.wait_for_service(ServiceName::Logger).expect("logger is up");
}

#[test]
fn wait_for_service_times_out() {
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[], &PlatformEnv::default()).unwrap();
    config.add_service(ServiceName::Logger, unused_address());

    let err = config.wait_for_service(ServiceName::Logger).unwrap_err();
    match err {
        Error::Timeout {
            service,
            alive,
            elapsed,
        } => {
            assert_eq!(service, ServiceName::Logger);
            assert!(alive);
            assert!(elapsed >= Duration::from_millis(2000));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn wait_for_service_to_die_after_shutdown() {
    let logger = StubServer::spawn(healthy());
    let env = env_with_services(&[(ServiceName::Logger, logger.address())]);
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env).unwrap();

    drop(logger);
    config
        .wait_for_service_to_die(ServiceName::Logger)
        .expect("logger is gone");
}

#[test]
fn wait_for_service_to_die_times_out_while_alive() {
    let logger = StubServer::spawn(healthy());
    let env = env_with_services(&[(ServiceName::Logger, logger.address())]);
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env).unwrap();

    let err = config
        .wait_for_service_to_die(ServiceName::Logger)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { alive: false, .. }));
    assert!(err.to_string().contains("go down"));
}

#[test]
fn wait_stays_within_budget_when_peer_hangs_late() {
    // Refuses with 503 at first, then stops answering near the end of the window.
    let born = Instant::now();
    let logger = StubServer::spawn(Router::new().route(
        "/",
        get(move || async move {
            if born.elapsed() < Duration::from_millis(1500) {
                (StatusCode::SERVICE_UNAVAILABLE, "starting")
            } else {
                tokio::time::sleep(Duration::from_secs(3)).await;
                (StatusCode::OK, "late")
            }
        }),
    ));
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[], &PlatformEnv::default()).unwrap();
    config.add_service(ServiceName::Logger, logger.address());

    let started = Instant::now();
    let err = config.wait_for_service(ServiceName::Logger).unwrap_err();
    assert!(matches!(err, Error::Timeout { alive: true, .. }));
    assert!(started.elapsed() < Duration::from_millis(2600), "took {:?}", started.elapsed());
}

#[tokio::test(flavor = "multi_thread")]
async fn bootstrap_inside_async_runtime() {
    let logger = StubServer::spawn(healthy());
    let env = env_with_services(&[(ServiceName::Logger, logger.address())]);

    let config = SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env)
        .expect("bootstrap from an async task");
    config.wait_for_service(ServiceName::Logger).expect("logger is up");
}
