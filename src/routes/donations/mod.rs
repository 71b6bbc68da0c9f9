use crate::AppState;
use crate::error::ApiError;
use crate::payments::availability::{self, Availability};
use crate::payments::{self, DonationRequest, ProviderCharge};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use axum_extra::extract::WithRejection;

pub mod webhook;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/paystack/initialize", post(paystack_initialize))
        .route("/flutterwave/initialize", post(flutterwave_initialize))
        .route("/coinbase/create-charge", post(coinbase_create_charge))
        .route("/coinbase/webhook", post(webhook::handler))
        .route("/available-methods", get(available_methods))
}

type DonationBody = WithRejection<Json<DonationRequest>, ApiError>;

#[tracing::instrument(skip_all, fields(project = ?request.project_id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    WithRejection(Json(request), _): DonationBody,
) -> Result<Json<ProviderCharge>, ApiError> {
    Ok(Json(payments::initiate(&state.gateway.stripe, &request).await?))
}

#[tracing::instrument(skip_all, fields(project = ?request.project_id))]
pub async fn paystack_initialize(
    State(state): State<AppState>,
    WithRejection(Json(request), _): DonationBody,
) -> Result<Json<ProviderCharge>, ApiError> {
    Ok(Json(payments::initiate(&state.gateway.paystack, &request).await?))
}

#[tracing::instrument(skip_all, fields(project = ?request.project_id))]
pub async fn flutterwave_initialize(
    State(state): State<AppState>,
    WithRejection(Json(request), _): DonationBody,
) -> Result<Json<ProviderCharge>, ApiError> {
    Ok(Json(payments::initiate(&state.gateway.flutterwave, &request).await?))
}

#[tracing::instrument(skip_all, fields(project = ?request.project_id))]
pub async fn coinbase_create_charge(
    State(state): State<AppState>,
    WithRejection(Json(request), _): DonationBody,
) -> Result<Json<ProviderCharge>, ApiError> {
    Ok(Json(payments::initiate(&state.gateway.coinbase, &request).await?))
}

#[tracing::instrument(skip_all)]
pub async fn available_methods(State(state): State<AppState>) -> Json<Availability> {
    Json(availability::report(&state.config.payments))
}
