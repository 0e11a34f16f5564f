//! HTTP client for the brokerage REST gateway.
//!
//! # Endpoints
//! - `GET {base}/portfolio/accounts`: resolves the default account
//! - `GET {base}/portfolio/{id}/positions/0`: first page of positions
//! - `GET {base}/portfolio/{id}/summary`: account summary
//!
//! Only the sections the request asks for are fetched.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::portfolio::provider::{PortfolioProvider, UpstreamError};
use crate::portfolio::types::{Portfolio, PortfolioRequest};

pub struct HttpPortfolioClient {
    client: Client,
    base_url: Url,
}

impl HttpPortfolioClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(concat!("portfolio-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| UpstreamError::Client(e.to_string()))?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        self.base_url
            .join(path)
            .map_err(|e| UpstreamError::Client(e.to_string()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "Upstream request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), &body));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn resolve_account(&self) -> Result<String, UpstreamError> {
        let accounts = self.get_json("portfolio/accounts").await?;
        first_account_id(&accounts)
    }
}

/// Pick the first account id out of an accounts listing.
fn first_account_id(accounts: &Value) -> Result<String, UpstreamError> {
    let list = accounts
        .as_array()
        .ok_or_else(|| UpstreamError::Decode("accounts listing is not an array".to_string()))?;
    let first = list.first().ok_or(UpstreamError::NoAccounts)?;
    first
        .get("accountId")
        .or_else(|| first.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| UpstreamError::Decode("account entry has no id".to_string()))
}

#[async_trait]
impl PortfolioProvider for HttpPortfolioClient {
    async fn fetch_portfolio(&self, request: &PortfolioRequest) -> Result<Portfolio, UpstreamError> {
        let account_id = match request.account_id() {
            Some(id) => id.to_string(),
            None => self.resolve_account().await?,
        };

        let positions = if request.include_positions() {
            match self
                .get_json(&format!("portfolio/{}/positions/0", account_id))
                .await?
            {
                Value::Array(items) => Some(items),
                _ => {
                    return Err(UpstreamError::Decode(
                        "positions payload is not an array".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let summary = if request.include_summary() {
            Some(
                self.get_json(&format!("portfolio/{}/summary", account_id))
                    .await?,
            )
        } else {
            None
        };

        Ok(Portfolio {
            account_id,
            positions,
            summary,
        })
    }
}
