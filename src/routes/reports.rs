use crate::AppState;
use crate::db::models::{NewReport, Report, SpendingDetail};
use crate::error::ApiError;
use crate::report_pdf;
use crate::routes::required;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum_extra::extract::WithRejection;
use serde_derive::Deserialize;

const REPORT_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}/pdf", get(pdf))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pdf_link: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub spending_details: Vec<SpendingDetail>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Report>>, ApiError> {
    let reports = state.db.list_reports().await?;
    if reports.is_empty() {
        return Err(ApiError::NotFound("No reports found".to_string()));
    }
    Ok(Json(reports))
}

#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<ReportInput>, ApiError>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let year = input
        .year
        .ok_or_else(|| ApiError::BadRequest("year is required".to_string()))?;
    if !REPORT_YEARS.contains(&year) {
        return Err(ApiError::BadRequest(format!(
            "year must be between {} and {}",
            REPORT_YEARS.start(),
            REPORT_YEARS.end()
        )));
    }
    if input.spending_details.iter().any(|d| d.category.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "spendingDetails.category is required".to_string(),
        ));
    }
    let new = NewReport {
        title: required("title", input.title)?,
        description: required("description", input.description)?,
        pdf_link: required("pdfLink", input.pdf_link)?,
        year,
        spending_details: serde_json::to_string(&input.spending_details)
            .map_err(crate::db::DbError::from)?,
        created_at: chrono::Utc::now().naive_utc(),
    };
    let report = state.db.insert_report(new).await?;
    tracing::info!(id = report.id, year = report.year, "report created");
    Ok((StatusCode::CREATED, Json(report)))
}

#[tracing::instrument(skip_all, fields(report = id))]
pub async fn pdf(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .db
        .find_report(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;
    let bytes = report_pdf::render(&report, &state.config.report)?;
    let disposition = format!("inline; filename=\"annual-report-{}.pdf\"", report.year);
    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
