//! HTTP endpoint handlers
//!
//! Each handler forwards one action to the session actor and reports the
//! resulting status.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use super::{
    app_state::AppState,
    responses::{ApiResponse, HealthResponse, StartRequest, StatusResponse, TimeoutsResponse},
};
use crate::{controller::Action, error::ControllerError, state::Timeout};

type ActionResult = (StatusCode, Json<ApiResponse>);
type StartBody = Result<Json<StartRequest>, JsonRejection>;

/// A request without a JSON body means "use the current selection"; a body
/// that does not parse is refused.
fn requested_timeout(state: &AppState, body: StartBody) -> Result<Option<Timeout>, ActionResult> {
    match body {
        Ok(Json(request)) => Ok(request.timeout),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(None),
        Err(rejection) => {
            let message = rejection.body_text();
            warn!("Rejecting request body: {}", message);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(message, state.session.status())),
            ))
        }
    }
}

async fn dispatch(state: &AppState, action: Action) -> ActionResult {
    state.record_action(action.name());

    match state.session.apply(action).await {
        Ok(session) => {
            info!(action = action.name(), "Action applied");
            (
                StatusCode::OK,
                Json(ApiResponse::from_session(
                    format!("{} applied", action.name()),
                    session,
                )),
            )
        }
        Err(e @ ControllerError::KeepAlive(_)) => {
            error!(action = action.name(), "Action failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(e.to_string(), state.session.status())),
            )
        }
        Err(e @ ControllerError::Closed) => {
            error!(action = action.name(), "Action failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string(), state.session.status())),
            )
        }
    }
}

/// Handle POST /start - Keep the display awake, optionally with a timeout
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: StartBody,
) -> ActionResult {
    match requested_timeout(&state, body) {
        Ok(timeout) => dispatch(&state, Action::StartNow { timeout }).await,
        Err(rejected) => rejected,
    }
}

/// Handle POST /stop - Let the display sleep again
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    dispatch(&state, Action::Stop).await
}

/// Handle POST /toggle - Start with the current selection, or stop
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    dispatch(&state, Action::Toggle).await
}

/// Handle POST /next - Switch to the next timeout immediately
pub async fn next_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    dispatch(&state, Action::AdvanceTimeout { debounce: false }).await
}

/// Handle POST /advance - Rapid-tap style advance with debounce
pub async fn advance_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    dispatch(&state, Action::AdvanceTimeout { debounce: true }).await
}

/// Handle POST /restart - Reset the countdown to its start value
pub async fn restart_handler(
    State(state): State<Arc<AppState>>,
    body: StartBody,
) -> ActionResult {
    match requested_timeout(&state, body) {
        Ok(timeout) => dispatch(&state, Action::Restart { timeout }).await,
        Err(rejected) => rejected,
    }
}

/// Handle POST /action/:name - Generic entry point for any named action
///
/// An unknown name stops the session rather than leaving it in whatever
/// state the caller assumed.
pub async fn action_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ActionResult {
    match name.parse::<Action>() {
        Ok(action) => dispatch(&state, action).await,
        Err(e) => {
            warn!("{}, stopping session", e);
            let (_, Json(response)) = dispatch(&state, Action::Stop).await;
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(e.to_string(), response.session)),
            )
        }
    }
}

/// Handle GET /status - Return the current session and countdown
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let status = state.session.status();
    let (last_action, last_action_time) = state.last_action();

    Json(StatusResponse {
        session: status.state,
        selection: status.selection,
        remaining_seconds: status
            .state
            .as_running()
            .and_then(|session| session.remaining().as_secs()),
        uptime: state.uptime(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /timeouts - List the selectable timeouts
pub async fn timeouts_handler(State(state): State<Arc<AppState>>) -> Json<TimeoutsResponse> {
    Json(TimeoutsResponse {
        timeouts: state.session.timeouts().to_vec(),
        selection: state.session.status().selection,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
