//! HTTP request handlers for the tracker API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::Employee;
use crate::qr::{QrPayload, ScanOutcome, process_scan};
use crate::report::HoursReport;
use crate::store::ManualEntry;

use super::request::{
    AddEmployeeRequest, ClockOutRequest, LookupQuery, QrKind, QrQuery, ScanRequest,
};
use super::response::{
    ApiError, ApiErrorResponse, EmployeeView, QrView, ScanView, TimeEntryView,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/employees", get(list_employees).post(add_employee))
        .route("/employees/lookup", get(lookup_employee))
        .route(
            "/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/employees/:id/clock-in", post(clock_in))
        .route("/employees/:id/clock-out", post(clock_out))
        .route("/employees/:id/entries", post(add_time_entry))
        .route(
            "/employees/:id/entries/:entry_id",
            put(update_time_entry).delete(delete_time_entry),
        )
        .route("/employees/:id/qr", get(employee_qr))
        .route("/employees/:id/entries/:entry_id/qr", get(time_entry_qr))
        .route("/qr/scan", post(scan))
        .route("/reports/hours", get(hours_report))
        .route("/reset", post(reset))
        .with_state(state)
}

/// Handler for GET /employees.
async fn list_employees(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    let store = state.store();
    let today = store.today();
    let employees: Vec<EmployeeView> = store
        .all_employees()
        .into_iter()
        .map(|e| EmployeeView::new(e, today))
        .collect();
    respond(correlation_id, "list_employees", StatusCode::OK, Ok(employees))
}

/// Handler for POST /employees.
async fn add_employee(
    State(state): State<AppState>,
    payload: Result<Json<AddEmployeeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let name = request.name.trim();
    if name.is_empty() {
        warn!(correlation_id = %correlation_id, "Rejected blank employee name");
        return ApiErrorResponse::bad_request(ApiError::validation_error(
            "Employee name must not be blank",
        ))
        .into_response();
    }

    let name = name.to_string();
    let employee_type = request.employee_type;
    let result = state
        .with_store(move |store| {
            store
                .add_employee(name, employee_type)
                .map(|e| EmployeeView::new(e, store.today()))
        })
        .await;
    respond(correlation_id, "add_employee", StatusCode::CREATED, result)
}

/// Handler for GET /employees/lookup?name=.
async fn lookup_employee(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let store = state.store();
    let result = store
        .employee_by_name(&query.name)
        .map(|e| EmployeeView::new(e, store.today()))
        .ok_or(TrackerError::EmployeeNameNotFound { name: query.name });
    respond(correlation_id, "lookup_employee", StatusCode::OK, result)
}

/// Handler for GET /employees/:id.
async fn get_employee(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let store = state.store();
    let result = find_employee(&state, &id).map(|e| EmployeeView::new(e, store.today()));
    respond(correlation_id, "get_employee", StatusCode::OK, result)
}

/// Handler for PUT /employees/:id.
///
/// The body is the full employee record; its id must match the path.
async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let employee = match payload {
        Ok(Json(employee)) => employee,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    if employee.id != id {
        warn!(
            correlation_id = %correlation_id,
            path_id = %id,
            body_id = %employee.id,
            "Employee id mismatch"
        );
        return ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "Body id '{}' does not match path id '{}'",
            employee.id, id
        )))
        .into_response();
    }

    let result = state
        .with_store(move |store| {
            store
                .update_employee(employee)
                .map(|e| EmployeeView::new(e, store.today()))
        })
        .await;
    respond(correlation_id, "update_employee", StatusCode::OK, result)
}

/// Handler for DELETE /employees/:id.
async fn delete_employee(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .with_store(move |store| {
            store.delete_employee(&id).and_then(|deleted| {
                deleted
                    .map(|e| EmployeeView::new(e, store.today()))
                    .ok_or(TrackerError::EmployeeNotFound { id })
            })
        })
        .await;
    respond(correlation_id, "delete_employee", StatusCode::OK, result)
}

/// Handler for POST /employees/:id/clock-in.
async fn clock_in(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .with_store(move |store| store.clock_in(&id).map(TimeEntryView::from))
        .await;
    respond(correlation_id, "clock_in", StatusCode::CREATED, result)
}

/// Handler for POST /employees/:id/clock-out.
///
/// The body is optional; without one the configured default break applies.
async fn clock_out(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ClockOutRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => ClockOutRequest::default(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let break_minutes = request
        .break_minutes
        .unwrap_or(state.config().clock_out.default_break_minutes);
    let result = state
        .with_store(move |store| {
            store
                .clock_out(&id, break_minutes)
                .map(TimeEntryView::from)
        })
        .await;
    respond(correlation_id, "clock_out", StatusCode::OK, result)
}

/// Handler for POST /employees/:id/entries.
async fn add_time_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ManualEntry>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let entry = match payload {
        Ok(Json(entry)) => entry,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = state
        .with_store(move |store| store.add_time_entry(&id, entry).map(TimeEntryView::from))
        .await;
    respond(correlation_id, "add_time_entry", StatusCode::CREATED, result)
}

/// Handler for PUT /employees/:id/entries/:entry_id.
async fn update_time_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
    payload: Result<Json<ManualEntry>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let entry = match payload {
        Ok(Json(entry)) => entry,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = state
        .with_store(move |store| {
            store
                .update_time_entry(&id, &entry_id, entry)
                .map(TimeEntryView::from)
        })
        .await;
    respond(correlation_id, "update_time_entry", StatusCode::OK, result)
}

/// Handler for DELETE /employees/:id/entries/:entry_id.
async fn delete_time_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .with_store(move |store| {
            store
                .delete_time_entry(&id, &entry_id)
                .map(TimeEntryView::from)
        })
        .await;
    respond(correlation_id, "delete_time_entry", StatusCode::OK, result)
}

/// Handler for GET /employees/:id/qr?kind=employee|summary.
async fn employee_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<QrQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let today = state.store().today();
    let result = find_employee(&state, &id).map(|employee| {
        let payload = match query.kind {
            QrKind::Employee => QrPayload::for_employee(&employee),
            QrKind::Summary => QrPayload::for_summary(&employee, today),
        };
        QrView {
            kind: payload.kind(),
            content: payload.encode(),
        }
    });
    respond(correlation_id, "employee_qr", StatusCode::OK, result)
}

/// Handler for GET /employees/:id/entries/:entry_id/qr.
async fn time_entry_qr(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = find_employee(&state, &id).and_then(|employee| {
        let entry = employee
            .time_entry(&entry_id)
            .ok_or_else(|| TrackerError::TimeEntryNotFound {
                employee_id: id.clone(),
                entry_id: entry_id.clone(),
            })?;
        let payload = QrPayload::for_time_entry(entry, &employee.name);
        Ok(QrView {
            kind: payload.kind(),
            content: payload.encode(),
        })
    });
    respond(correlation_id, "time_entry_qr", StatusCode::OK, result)
}

/// Handler for POST /qr/scan.
///
/// Repeats of the last admitted content within the scanner cooldown are
/// answered with a `debounced` outcome and not applied.
async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let admitted = state.debouncer().admit(&request.content, Instant::now());
    let result = if admitted {
        let content = request.content;
        state
            .with_store(move |store| process_scan(store, &content))
            .await
    } else {
        info!(correlation_id = %correlation_id, "Scan debounced");
        Ok(ScanOutcome::Debounced)
    };
    respond(
        correlation_id,
        "scan",
        StatusCode::OK,
        result.map(ScanView::from),
    )
}

/// Handler for GET /reports/hours.
async fn hours_report(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    let report = HoursReport::build(state.store());
    respond(correlation_id, "hours_report", StatusCode::OK, Ok(report))
}

/// Handler for POST /reset.
async fn reset(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.with_store(|store| store.reset_all_data()).await {
        Ok(()) => {
            info!(correlation_id = %correlation_id, "All data reset");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => failure(correlation_id, "reset", err),
    }
}

fn find_employee(state: &AppState, id: &str) -> TrackerResult<Employee> {
    state
        .store()
        .employee(id)
        .ok_or_else(|| TrackerError::EmployeeNotFound { id: id.to_string() })
}

/// Renders a handler result, logging its outcome under the correlation id.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    status: StatusCode,
    result: TrackerResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                status = status.as_u16(),
                "Request completed"
            );
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(body),
            )
                .into_response()
        }
        Err(err) => failure(correlation_id, operation, err),
    }
}

fn failure(correlation_id: Uuid, operation: &'static str, err: TrackerError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        operation,
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err).into_response()
}

/// Maps a JSON body rejection to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDateTime;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::clock::FixedClock;
    use crate::config::TrackerConfig;
    use crate::models::EmployeeType;
    use crate::store::EmployeeStore;

    fn create_test_state() -> AppState {
        let start =
            NaiveDateTime::parse_from_str("2024-01-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let store = EmployeeStore::in_memory(Arc::new(FixedClock::new(start)));
        AppState::new(Arc::new(store), TrackerConfig::default())
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        let request = builder
            .body(Body::from(body.unwrap_or_default().to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_add_employee_returns_201() {
        let router = create_router(create_test_state());
        let (status, json) = send(
            router,
            "POST",
            "/employees",
            Some(r#"{"name":"Ada","type":"MANAGER"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["type"], "MANAGER");
        assert_eq!(json["isClockedIn"], false);
    }

    #[tokio::test]
    async fn test_blank_name_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = send(router, "POST", "/employees", Some(r#"{"name":"  "}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = send(router, "POST", "/employees", Some("{invalid json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let router = create_router(create_test_state());
        let (status, json) = send(router, "POST", "/employees", Some(r#"{"type":"STAFF"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_employee_returns_404() {
        let router = create_router(create_test_state());
        let (status, json) = send(router, "GET", "/employees/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "EMPLOYEE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_clock_out_without_body_uses_default_break() {
        let state = create_test_state();
        let employee = state
            .store()
            .add_employee("Ada", EmployeeType::Staff)
            .unwrap();
        state.store().clock_in(&employee.id).unwrap();

        let router = create_router(state);
        let uri = format!("/employees/{}/clock-out", employee.id);
        let (status, json) = send(router, "POST", &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["breakMinutes"], 30);
    }

    #[tokio::test]
    async fn test_update_with_mismatched_id_returns_400() {
        let state = create_test_state();
        let employee = state
            .store()
            .add_employee("Ada", EmployeeType::Staff)
            .unwrap();

        let router = create_router(state);
        let uri = format!("/employees/{}", employee.id);
        let body = r#"{"id":"other","name":"Ada","type":"STAFF","timeEntries":[]}"#;
        let (status, json) = send(router, "PUT", &uri, Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reset_returns_204() {
        let state = create_test_state();
        state
            .store()
            .add_employee("Ada", EmployeeType::Staff)
            .unwrap();

        let router = create_router(state.clone());
        let (status, json) = send(router, "POST", "/reset", None).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(json, Value::Null);
        assert!(state.store().is_empty());
    }
}
