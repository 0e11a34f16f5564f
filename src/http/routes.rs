//! Route handlers.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::portfolio::{FieldError, Portfolio, PortfolioQuery, PortfolioRequest};
use crate::security::VerifiedToken;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthCheckResponse {
    pub fn now() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "Portfolio gateway is running".to_string(),
    })
}

pub async fn health() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::now())
}

/// `GET /api/v1/portfolio`.
///
/// Authentication (when enabled) has already run as route middleware, so a
/// bad token never reaches query validation or the upstream call.
pub async fn portfolio(
    State(state): State<AppState>,
    caller: Option<Extension<VerifiedToken>>,
    query: Result<Query<PortfolioQuery>, QueryRejection>,
) -> Result<Json<Portfolio>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::Validation(vec![FieldError::new("query", e.body_text())]))?;
    let request = PortfolioRequest::from_query(&query).map_err(ApiError::Validation)?;

    let caller = caller.as_ref().map(|Extension(token)| token);
    let portfolio = state.service.get_portfolio(Some(request), caller).await?;
    Ok(Json(portfolio))
}
