use axum::{
	Json, Router,
	extract::{Path, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use wayfare_domain::{SearchEntry, SessionState, Trip};
use wayfare_service::{
	CancelSearchResponse, ChatRequest, ChatResponse, Error, PollRequest, ReviseSearchRequest,
	StartSearchRequest, StartSearchResponse, TripIdsResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/search", post(start_search))
		.route("/api/search/poll", post(poll))
		.route("/api/search/{search_id}/trip-ids", get(trip_ids))
		.route("/api/search/{search_id}/revise", post(revise_search))
		.route("/api/search/{search_id}/cancel", post(cancel_search))
		.route("/api/trips/{trip_id}", get(trip))
		.route("/api/chat", post(chat))
		.route("/api/sessions/{session_id}", get(session))
		.route("/api/sessions/{session_id}/reset", post(reset_session))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn start_search(
	State(state): State<AppState>,
	payload: Result<Json<StartSearchRequest>, JsonRejection>,
) -> Result<Json<StartSearchResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.start_search(payload)?;

	Ok(Json(response))
}

async fn poll(
	State(state): State<AppState>,
	payload: Result<Json<PollRequest>, JsonRejection>,
) -> Result<Json<SearchEntry>, ApiError> {
	let Json(payload) = payload?;
	let entry = state.service.poll(payload)?;

	Ok(Json(entry))
}

async fn trip_ids(
	State(state): State<AppState>,
	Path(search_id): Path<String>,
) -> Result<Json<TripIdsResponse>, ApiError> {
	let response = state.service.get_trip_ids(&search_id)?;

	Ok(Json(response))
}

async fn revise_search(
	State(state): State<AppState>,
	Path(search_id): Path<String>,
	payload: Result<Json<ReviseSearchRequest>, JsonRejection>,
) -> Result<Json<StartSearchResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.revise_search(&search_id, payload)?;

	Ok(Json(response))
}

async fn cancel_search(
	State(state): State<AppState>,
	Path(search_id): Path<String>,
) -> Result<Json<CancelSearchResponse>, ApiError> {
	let response = state.service.cancel_search(&search_id)?;

	Ok(Json(response))
}

async fn trip(
	State(state): State<AppState>,
	Path(trip_id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
	let trip = state.service.get_trip(&trip_id)?;

	Ok(Json(trip))
}

async fn chat(
	State(state): State<AppState>,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.chat(payload).await?;

	Ok(Json(response))
}

async fn session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> Result<Json<SessionState>, ApiError> {
	let session = state.service.get_session(&session_id)?;

	Ok(Json(session))
}

async fn reset_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.reset_session(&session_id)?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message),
			Error::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message),
			Error::Provider { message } => {
				tracing::error!(error = %message, "Collaborator call failed.");

				json_error(StatusCode::BAD_GATEWAY, "provider_error", message)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}
