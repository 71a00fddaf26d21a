//! pz-logger: the service other pz processes ship their syslog records to.
//!
//! # Endpoints
//!
//! - `POST /syslog` - validate and store one JSON record
//! - `GET /syslog?page=p&perPage=n&order=desc` - newest records, paged
//! - `GET /` - health check
//!
//! # Configuration
//!
//! - `VCAP_APPLICATION`, `PORT` - platform identity (local default port 14600)
//! - `LOGGER_FILE` - also append every accepted record to this file
//! - `RUST_LOG`, `LOG_FORMAT` - process diagnostics

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, warn};

use pz_common::syslog::{FileWriter, MemoryWriter, MultiWriter, Reader, SyslogMessage, Writer};
use pz_common::{DataType, JsonResponse, Pagination, ServiceName, SortOrder, SystemConfig};
use pz_service_shared::{health_check, init_logging, serve, LoggingConfig, ServiceResponse};

const LOGGER_FILE_ENV: &str = "LOGGER_FILE";

#[derive(Clone)]
struct AppState {
    store: Arc<MemoryWriter>,
    sink: Arc<dyn Writer>,
}

impl AppState {
    fn new(mirror: Option<FileWriter>) -> Self {
        let store = Arc::new(MemoryWriter::new());
        let mut sink = MultiWriter::new(vec![store.clone() as Arc<dyn Writer>]);
        if let Some(file) = mirror {
            sink.push(Arc::new(file));
        }
        Self {
            store,
            sink: Arc::new(sink),
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/syslog", get(list_records).post(post_record))
        .with_state(state)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env().with_service(ServiceName::Logger.as_str()));

    // Bootstrap uses a blocking HTTP client, so it runs before the runtime exists.
    let config = SystemConfig::new(ServiceName::Logger, &[ServiceName::Logger]).map_err(|e| {
        error!(error = %e, "bootstrap failed");
        e
    })?;

    let mirror = env::var(LOGGER_FILE_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(FileWriter::new);
    if let Some(file) = &mirror {
        info!(path = %file.path().display(), "mirroring records to file");
    }

    info!(address = %config.address(), bind_to = %config.bind_to(), "starting logger service");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config.bind_to(), router(AppState::new(mirror))))?;

    Ok(())
}

/// Handle `POST /syslog`.
async fn post_record(
    State(state): State<AppState>,
    Json(record): Json<SyslogMessage>,
) -> ServiceResponse {
    if let Err(e) = record.validate() {
        warn!(error = %e, "rejecting record");
        return e.into();
    }

    match state.sink.write(&record) {
        Ok(()) => JsonResponse::new(200)
            .with_message("record stored")
            .into(),
        Err(e) => {
            error!(error = %e, "failed to store record");
            e.into()
        }
    }
}

/// Handle `GET /syslog`.
///
/// Pages count back from the newest record; `order` sorts within the page.
async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ServiceResponse {
    let pagination = match Pagination::from_params(&params) {
        Ok(pagination) => pagination,
        Err(e) => return e.into(),
    };

    let offset = pagination.offset();
    let wanted = offset.saturating_add(pagination.per_page);
    let mut records = match state.store.read(isize::try_from(wanted).unwrap_or(isize::MAX)) {
        Ok(records) => records,
        Err(e) => return e.into(),
    };
    records.truncate(records.len().saturating_sub(offset));
    if pagination.order == SortOrder::Descending {
        records.reverse();
    }

    let total = state.store.len();
    JsonResponse::ok(DataType::Syslog, json!(records))
        .with_pagination(pagination.with_count(total))
        .into()
}
