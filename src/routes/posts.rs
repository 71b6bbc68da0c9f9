use crate::AppState;
use crate::db::models::{NewPost, Post};
use crate::error::ApiError;
use crate::routes::required;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum_extra::extract::WithRejection;
use serde_derive::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create))
}

#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.db.list_posts().await?;
    if posts.is_empty() {
        return Err(ApiError::NotFound("No posts found".to_string()));
    }
    Ok(Json(posts))
}

#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<PostInput>, ApiError>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let new = NewPost {
        title: required("title", input.title)?,
        content: required("content", input.content)?,
        image: required("image", input.image)?,
        date: chrono::Utc::now().naive_utc(),
    };
    let post = state.db.insert_post(new).await?;
    tracing::info!(id = post.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}
