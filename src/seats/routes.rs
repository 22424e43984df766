//! HTTP endpoints for the seat claim service.

use crate::seats::export::{export_claims, ExportFormat};
use crate::seats::model::{ClaimOutcome, ClaimRejection, ClaimRequest, ClaimRow, SeatStatus};
use crate::seats::store::{self, SeatDb};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct SeatState {
    db: SeatDb,
}

impl SeatState {
    pub fn new(db: SeatDb) -> Self {
        Self { db }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

impl ApiResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            reason: None,
            message: message.into(),
        }
    }

    fn rejected(rejection: ClaimRejection) -> Self {
        Self {
            success: false,
            reason: Some(rejection.code().to_string()),
            message: rejection.message().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedSeatsResponse {
    pub selected_seats: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatMapResponse {
    pub seats: Vec<SeatStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimsResponse {
    pub claims: Vec<ClaimRow>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

fn rejection_status(rejection: ClaimRejection) -> StatusCode {
    match rejection {
        ClaimRejection::Malformed | ClaimRejection::Incomplete | ClaimRejection::InvalidSeat => {
            StatusCode::BAD_REQUEST
        }
        ClaimRejection::SeatTaken | ClaimRejection::AlreadyClaimed => StatusCode::CONFLICT,
        ClaimRejection::Database => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn database_error(e: impl std::fmt::Display) -> Response {
    tracing::error!("❌ Database operation failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::rejected(ClaimRejection::Database)),
    )
        .into_response()
}

/// POST /api/select_seat
async fn select_seat(
    State(state): State<SeatState>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::debug!("Unreadable claim request: {}", e.body_text());
            let rejection = ClaimRejection::Malformed;
            return (rejection_status(rejection), Json(ApiResponse::rejected(rejection)))
                .into_response();
        }
    };
    let seat_count = state.db.seat_count();
    let outcome = state
        .db
        .with_connection(move |conn| store::claim_seat(conn, &req, seat_count))
        .await;

    match outcome {
        Ok(ClaimOutcome::Accepted { seat_number }) => {
            Json(ApiResponse::ok(format!("成功选择座位{}", seat_number))).into_response()
        }
        Ok(ClaimOutcome::Rejected(rejection)) => {
            tracing::debug!("Claim rejected: {}", rejection.code());
            (rejection_status(rejection), Json(ApiResponse::rejected(rejection))).into_response()
        }
        Err(e) => database_error(e),
    }
}

/// GET /api/get_selected_seats
async fn get_selected_seats(State(state): State<SeatState>) -> Response {
    match state
        .db
        .with_connection(|conn| store::selected_seats(conn))
        .await
    {
        Ok(selected_seats) => Json(SelectedSeatsResponse { selected_seats }).into_response(),
        Err(e) => database_error(e),
    }
}

/// GET /api/seats
async fn get_seat_map(State(state): State<SeatState>) -> Response {
    let seat_count = state.db.seat_count();
    match state
        .db
        .with_connection(move |conn| store::seat_map(conn, seat_count))
        .await
    {
        Ok(seats) => Json(SeatMapResponse { seats }).into_response(),
        Err(e) => database_error(e),
    }
}

/// GET /api/claims
async fn get_claims(State(state): State<SeatState>) -> Response {
    match state.db.with_connection(|conn| store::all_claims(conn)).await {
        Ok(claims) => Json(ClaimsResponse { claims }).into_response(),
        Err(e) => database_error(e),
    }
}

/// GET /api/export_excel?format=xlsx|csv
async fn export_excel(State(state): State<SeatState>, Query(query): Query<ExportQuery>) -> Response {
    let now = chrono::Local::now().naive_local();
    let export = state
        .db
        .with_connection(move |conn| {
            let rows = store::all_claims(conn)?;
            export_claims(&rows, query.format, now)
        })
        .await;

    match export {
        Ok(Some(file)) => {
            tracing::info!("Exported {} ({} bytes)", file.file_name, file.bytes.len());
            (
                [
                    (header::CONTENT_TYPE, file.format.content_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file.file_name),
                    ),
                ],
                file.bytes,
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                reason: None,
                message: "暂无数据".to_string(),
            }),
        )
            .into_response(),
        Err(e) => database_error(e),
    }
}

/// POST /api/clear_data
async fn clear_data(State(state): State<SeatState>) -> Response {
    match state.db.with_connection(|conn| store::clear_all(conn)).await {
        Ok(_) => Json(ApiResponse::ok("数据已清空")).into_response(),
        Err(e) => database_error(e),
    }
}

/// Create router for seat claim endpoints
pub fn create_seat_router(db: SeatDb) -> Router {
    Router::new()
        .route("/api/select_seat", post(select_seat))
        .route("/api/get_selected_seats", get(get_selected_seats))
        .route("/api/seats", get(get_seat_map))
        .route("/api/claims", get(get_claims))
        .route("/api/export_excel", get(export_excel))
        .route("/api/clear_data", post(clear_data))
        .with_state(SeatState::new(db))
}
