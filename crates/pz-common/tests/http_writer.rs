mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pz_common::syslog::{HttpWriter, Logger, SyslogMessage, Writer};
use pz_common::{Error, PlatformEnv, ServiceName, SystemConfig};
use reqwest::blocking::Client;
use serde_json::{json, Value};

use common::{client_off_runtime, env_with_services, unused_address, StubServer};

type Received = Arc<Mutex<Vec<SyslogMessage>>>;

async fn accept(State(received): State<Received>, Json(record): Json<SyslogMessage>) -> Json<Value> {
    received.lock().unwrap().push(record);
    Json(json!({ "statusCode": 200 }))
}

fn logger_stub() -> (StubServer, Received) {
    let received = Received::default();
    let router = Router::new()
        .route("/", get(|| async { "Hi" }))
        .route("/syslog", post(accept))
        .with_state(received.clone());
    (StubServer::spawn(router), received)
}

#[test]
fn posts_records_to_logger() {
    let (stub, received) = logger_stub();
    let writer = HttpWriter::with_client(stub.url(), Client::new());
    assert_eq!(writer.url(), format!("{}/syslog", stub.url()));

    let record = SyslogMessage::new()
        .with_application("pz-workflow")
        .with_message("job queued");
    writer.write(&record).expect("logger accepts record");

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], record);
}

#[test]
fn sink_from_system_config() {
    let (stub, received) = logger_stub();
    let env = env_with_services(&[(ServiceName::Logger, stub.address())]);
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[ServiceName::Logger], &env).unwrap();

    let logger = Logger::new(Arc::new(HttpWriter::new(&config).unwrap()))
        .with_application("pz-workflow");
    logger.error("lost connection to broker").unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received[0].severity, 3);
    assert_eq!(received[0].application, "pz-workflow");
}

#[test]
fn error_envelope_is_reported() {
    let router = Router::new().route(
        "/syslog",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "statusCode": 400, "type": "error", "message": "bad record" })),
            )
        }),
    );
    let stub = StubServer::spawn(router);
    let writer = HttpWriter::with_client(stub.url(), Client::new());

    let err = writer.write(&SyslogMessage::new()).unwrap_err();
    match err {
        Error::RemoteSink { message } => assert!(message.contains("bad record")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn error_status_in_envelope_fails_even_on_http_ok() {
    let router = Router::new().route(
        "/syslog",
        post(|| async { Json(json!({ "statusCode": 500, "message": "index down" })) }),
    );
    let stub = StubServer::spawn(router);
    let writer = HttpWriter::with_client(stub.url(), Client::new());

    assert!(matches!(
        writer.write(&SyslogMessage::new()),
        Err(Error::RemoteSink { .. })
    ));
}

#[test]
fn unreadable_body_is_reported() {
    let router = Router::new().route("/syslog", post(|| async { "not json" }));
    let stub = StubServer::spawn(router);
    let writer = HttpWriter::with_client(stub.url(), Client::new());

    assert!(matches!(
        writer.write(&SyslogMessage::new()),
        Err(Error::RemoteSink { .. })
    ));
}

#[test]
fn unreachable_logger_is_reported() {
    let writer = HttpWriter::with_client(format!("http://{}", unused_address()), Client::new());
    assert!(matches!(
        writer.write(&SyslogMessage::new()),
        Err(Error::RemoteSink { .. })
    ));
}

#[test]
fn sink_from_system_config_waits_for_logger() {
    let config =
        SystemConfig::with_env(ServiceName::Workflow, &[], &PlatformEnv::default()).unwrap();
    config.add_service(ServiceName::Logger, unused_address());

    match HttpWriter::new(&config) {
        Err(Error::Timeout { service, alive, .. }) => {
            assert_eq!(service, ServiceName::Logger);
            assert!(alive);
        }
        other => panic!("expected a timeout, got {:?}", other.map(|w| w.url().to_string())),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn write_from_spawned_task() {
    let (stub, received) = logger_stub();
    let writer = Arc::new(HttpWriter::with_client(stub.url(), client_off_runtime()));

    let tasks: Vec<_> = (0..4)
        .map(|n| {
            let writer = writer.clone();
            tokio::spawn(async move {
                writer.write(&SyslogMessage::new().with_message(format!("task {}", n)))
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("task completes").expect("write succeeds");
    }

    assert_eq!(received.lock().unwrap().len(), 4);
}

#[tokio::test(flavor = "current_thread")]
async fn write_from_current_thread_runtime() {
    let (stub, received) = logger_stub();
    let logger = Logger::new(Arc::new(HttpWriter::with_client(stub.url(), client_off_runtime())));

    logger.warning("from a handler").unwrap();

    assert_eq!(received.lock().unwrap()[0].message, "from a handler");
}
