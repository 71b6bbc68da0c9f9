use crate::AppState;
use crate::db::models::{NewContact, NewSubscriber};
use crate::error::ApiError;
use crate::routes::{looks_like_email, required};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum_extra::extract::WithRejection;
use serde_derive::Deserialize;
use serde_json::{Value, json};

pub fn contact_router() -> Router<AppState> {
    Router::new().route("/", post(send_message))
}

pub fn newsletter_router() -> Router<AppState> {
    Router::new().route("/", post(subscribe))
}

#[derive(Debug, Deserialize)]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeInput {
    pub email: Option<String>,
}

fn email(value: Option<String>) -> Result<String, ApiError> {
    let email = required("email", value)?;
    if !looks_like_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(email.to_ascii_lowercase())
}

#[tracing::instrument(skip_all)]
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<ContactInput>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let contact = NewContact {
        name: required("name", input.name)?,
        email: email(input.email)?,
        message: required("message", input.message)?,
        created_at: chrono::Utc::now().naive_utc(),
    };
    state.db.insert_contact(contact).await?;
    tracing::info!("contact message stored");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully" })),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<SubscribeInput>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subscriber = NewSubscriber {
        email: email(input.email)?,
        created_at: chrono::Utc::now().naive_utc(),
    };
    match state.db.insert_subscriber(subscriber).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::BadRequest("Email already subscribed".to_string()));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("newsletter subscriber added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Subscribed successfully" })),
    ))
}
