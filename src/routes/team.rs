use crate::AppState;
use crate::db::models::{Leader, StaffMember};
use crate::error::ApiError;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;

pub fn leadership_router() -> Router<AppState> {
    Router::new().route("/", get(list_leadership))
}

pub fn staff_router() -> Router<AppState> {
    Router::new().route("/", get(list_staff))
}

pub async fn list_leadership(State(state): State<AppState>) -> Result<Json<Vec<Leader>>, ApiError> {
    Ok(Json(state.db.list_leadership().await?))
}

pub async fn list_staff(State(state): State<AppState>) -> Result<Json<Vec<StaffMember>>, ApiError> {
    Ok(Json(state.db.list_staff().await?))
}
