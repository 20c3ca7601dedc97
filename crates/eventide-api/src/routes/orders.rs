//! Routes for the order lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use eventide_core::event::EventMessage;
use eventide_ordering::application::command_handlers;
use eventide_ordering::application::query_handlers::{self, OrderView};
use eventide_ordering::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Identity of the new order.
    pub order_id: String,
    /// The customer placing the order.
    pub customer: String,
}

/// Request body for POST /{order_id}/ship.
#[derive(Debug, Deserialize)]
pub struct ShipOrderRequest {
    /// The carrier handling delivery.
    pub carrier: String,
    /// The order version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for POST /{order_id}/cancel.
#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    /// Why the order is cancelled.
    pub reason: String,
    /// The order version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The order the command applied to.
    pub order_id: String,
    /// IDs of the events committed to the order's stream.
    pub event_ids: Vec<Uuid>,
    /// Stream position of the last committed event.
    pub version: Option<i64>,
}

impl CommandResponse {
    fn from_committed(order_id: String, committed: &[EventMessage]) -> Self {
        Self {
            order_id,
            event_ids: committed.iter().map(EventMessage::event_id).collect(),
            version: committed.last().and_then(EventMessage::version),
        }
    }
}

/// POST /
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let command = commands::CreateOrder {
        correlation_id: Uuid::new_v4(),
        order_id: request.order_id,
        customer: request.customer,
    };

    info!(correlation_id = %command.correlation_id, "handling create_order command");

    let committed = command_handlers::handle_create_order(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommandResponse::from_committed(command.order_id, &committed)),
    ))
}

/// POST /{order_id}/ship
#[instrument(skip(state, request))]
async fn ship_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<ShipOrderRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ShipOrder {
        correlation_id: Uuid::new_v4(),
        order_id,
        carrier: request.carrier,
        expected_version: request.expected_version,
    };

    info!(correlation_id = %command.correlation_id, "handling ship_order command");

    let committed = command_handlers::handle_ship_order(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
    )
    .await?;

    Ok(Json(CommandResponse::from_committed(
        command.order_id,
        &committed,
    )))
}

/// POST /{order_id}/cancel
#[instrument(skip(state, request))]
async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CancelOrder {
        correlation_id: Uuid::new_v4(),
        order_id,
        reason: request.reason,
        expected_version: request.expected_version,
    };

    info!(correlation_id = %command.correlation_id, "handling cancel_order command");

    let committed = command_handlers::handle_cancel_order(
        &command,
        state.clock.as_ref(),
        state.repository.as_ref(),
    )
    .await?;

    Ok(Json(CommandResponse::from_committed(
        command.order_id,
        &committed,
    )))
}

/// GET /{order_id}
#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let view = query_handlers::get_order_by_id(&order_id, state.repository.as_ref()).await?;
    Ok(Json(view))
}

/// Returns the router for the order context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/ship", post(ship_order))
        .route("/{order_id}/cancel", post(cancel_order))
}
