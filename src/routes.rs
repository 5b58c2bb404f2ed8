use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{AppState, context::Ctx};

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new().route("/movies/{id}", get(get_movie_by_id));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn get_movie_by_id(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let id: i32 = match id.parse() {
        Ok(id) => id,
        Err(err) => {
            let body = serde_json::json!({ "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        },
    };

    let ctx = Ctx::with_timeout(state.config.query_timeout);
    match state.movies.get_movie_by_id(&ctx, id).await {
        Ok(movie) => Json(movie).into_response(),
        Err(err) => {
            if err.is_not_found() {
                tracing::debug!(movie_id = id, "movie not found");
            } else {
                tracing::warn!(movie_id = id, error = %err, "movie lookup failed");
            }
            err.into_response()
        },
    }
}
