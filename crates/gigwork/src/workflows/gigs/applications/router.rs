use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ActorRole, ApplicationId, ConfirmDecision, GigId, ReviewDecision};
use super::repository::{ApplicationRepository, GigDirectory, NotificationDispatcher};
use super::service::{ActionReceipt, GigApplicationService, LifecycleError};

/// Router builder exposing the four lifecycle actions plus a status view.
///
/// Authentication is out of scope; the upstream gateway resolves the caller
/// and forwards identity as `x-actor-id` / `x-actor-role` headers.
pub fn application_router<G, R, N>(service: Arc<GigApplicationService<G, R, N>>) -> Router
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/gigs/:gig_id/applications",
            post(apply_handler::<G, R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<G, R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/cancel",
            post(cancel_handler::<G, R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/confirm",
            post(confirm_handler::<G, R, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<G, R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) decision: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmRequest {
    pub(crate) decision: ConfirmDecision,
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());
    let role = headers
        .get("x-actor-role")
        .and_then(|value| value.to_str().ok())
        .and_then(ActorRole::parse_label);

    match (id, role) {
        (Some(id), Some(role)) => Ok(Actor {
            id: id.to_string(),
            role,
        }),
        _ => {
            let payload = json!({
                "error": "missing or invalid x-actor-id / x-actor-role headers",
            });
            Err((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response())
        }
    }
}

fn receipt_response(receipt: ActionReceipt) -> Response {
    // Self-cancellation on accept is the one success-path 409: the caller
    // needs the conflicting-gig list to explain what happened.
    if !receipt.conflicts.is_empty() {
        let conflicts: Vec<_> = receipt
            .conflicts
            .iter()
            .map(|conflict| {
                json!({
                    "gig_id": conflict.gig_id,
                    "title": conflict.title,
                    "date_range": conflict.date_range(),
                    "time_range": conflict.time_range(),
                })
            })
            .collect();
        let payload = json!({
            "application_id": receipt.application_id,
            "status": receipt.status,
            "conflicts": conflicts,
        });
        return (StatusCode::CONFLICT, axum::Json(payload)).into_response();
    }

    (StatusCode::OK, axum::Json(receipt)).into_response()
}

fn error_response(error: LifecycleError) -> Response {
    let status = error.status_code();
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn apply_handler<G, R, N>(
    State(service): State<Arc<GigApplicationService<G, R, N>>>,
    Path(gig_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.apply(&actor, &GigId(gig_id)) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<G, R, N>(
    State(service): State<Arc<GigApplicationService<G, R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.review(&actor, &ApplicationId(application_id), request.decision) {
        Ok(receipt) => receipt_response(receipt),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<G, R, N>(
    State(service): State<Arc<GigApplicationService<G, R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.cancel(&actor, &ApplicationId(application_id)) {
        Ok(receipt) => receipt_response(receipt),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_handler<G, R, N>(
    State(service): State<Arc<GigApplicationService<G, R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ConfirmRequest>,
) -> Response
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.confirm(&actor, &ApplicationId(application_id), request.decision) {
        Ok(receipt) => receipt_response(receipt),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<G, R, N>(
    State(service): State<Arc<GigApplicationService<G, R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.status(&actor, &ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}
