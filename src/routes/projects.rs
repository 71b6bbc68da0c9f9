use crate::AppState;
use crate::db::models::{NewProject, Project};
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
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub is_video: Option<bool>,
}

impl TryFrom<ProjectInput> for NewProject {
    type Error = ApiError;

    fn try_from(input: ProjectInput) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required("title", input.title)?,
            description: required("description", input.description)?,
            image: required("image", input.image)?,
            link: required("link", input.link)?,
            is_video: input.is_video.unwrap_or(false),
        })
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.db.list_projects().await?))
}

#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<ProjectInput>, ApiError>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.db.insert_project(NewProject::try_from(input)?).await?;
    tracing::info!(id = project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}
