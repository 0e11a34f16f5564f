//! Portfolio request orchestration.
//!
//! Takes an already-validated request, calls the provider once and shapes
//! the outcome. Upstream failures are logged in full and turned into a
//! client-facing message according to the configured [`ErrorExposure`].

use std::sync::Arc;

use crate::config::ErrorExposure;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::portfolio::provider::PortfolioProvider;
use crate::portfolio::types::{Portfolio, PortfolioRequest};
use crate::security::{sanitize, VerifiedToken};

#[derive(Clone)]
pub struct PortfolioService {
    provider: Arc<dyn PortfolioProvider>,
    exposure: ErrorExposure,
}

impl PortfolioService {
    pub fn new(provider: Arc<dyn PortfolioProvider>, exposure: ErrorExposure) -> Self {
        Self { provider, exposure }
    }

    pub fn exposure(&self) -> ErrorExposure {
        self.exposure
    }

    /// Fetch a portfolio. `None` means "all defaults".
    pub async fn get_portfolio(
        &self,
        request: Option<PortfolioRequest>,
        caller: Option<&VerifiedToken>,
    ) -> Result<Portfolio, ApiError> {
        let request = request.unwrap_or_default();

        tracing::info!(
            account_id = ?request.account_id(),
            include_positions = request.include_positions(),
            include_summary = request.include_summary(),
            caller = caller.map(VerifiedToken::hint),
            "Portfolio request"
        );

        match self.provider.fetch_portfolio(&request).await {
            Ok(portfolio) => {
                tracing::info!(account_id = %portfolio.account_id, "Portfolio data retrieved");
                Ok(portfolio)
            }
            Err(e) => {
                metrics::record_upstream_failure(e.kind());
                let detail = match self.exposure {
                    ErrorExposure::Sanitized => {
                        tracing::warn!(kind = e.kind(), "Portfolio fetch failed");
                        sanitize(&e).as_str().to_string()
                    }
                    ErrorExposure::Verbatim => {
                        tracing::error!(kind = e.kind(), error = %e, "Portfolio fetch failed");
                        e.to_string()
                    }
                };
                Err(ApiError::Upstream(detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::provider::UpstreamError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<PortfolioRequest>>,
        fail_with: Option<fn() -> UpstreamError>,
    }

    #[async_trait]
    impl PortfolioProvider for Recording {
        async fn fetch_portfolio(
            &self,
            request: &PortfolioRequest,
        ) -> Result<Portfolio, UpstreamError> {
            self.seen.lock().unwrap().push(request.clone());
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(Portfolio {
                    account_id: request.account_id().unwrap_or("U0").to_string(),
                    positions: None,
                    summary: None,
                }),
            }
        }
    }

    fn connection_refused() -> UpstreamError {
        UpstreamError::Connection("tcp connect error 10.9.8.7:5000".into())
    }

    fn provider(fail_with: Option<fn() -> UpstreamError>) -> Arc<Recording> {
        Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            fail_with,
        })
    }

    #[tokio::test]
    async fn substitutes_default_request() {
        let p = provider(None);
        let service = PortfolioService::new(p.clone(), ErrorExposure::Sanitized);
        let portfolio = service.get_portfolio(None, None).await.unwrap();
        assert_eq!(portfolio.account_id, "U0");
        assert_eq!(p.seen.lock().unwrap()[0], PortfolioRequest::default());
    }

    #[tokio::test]
    async fn forwards_request_fields() {
        let p = provider(None);
        let service = PortfolioService::new(p.clone(), ErrorExposure::Sanitized);
        let request = PortfolioRequest::new(Some("U42".into()), false, true).unwrap();
        let portfolio = service.get_portfolio(Some(request.clone()), None).await.unwrap();
        assert_eq!(portfolio.account_id, "U42");
        assert_eq!(p.seen.lock().unwrap()[0], request);
    }

    #[tokio::test]
    async fn sanitized_policy_hides_upstream_text() {
        let p = provider(Some(connection_refused as fn() -> UpstreamError));
        let service = PortfolioService::new(p, ErrorExposure::Sanitized);
        match service.get_portfolio(None, None).await {
            Err(ApiError::Upstream(detail)) => {
                assert_eq!(detail, "Service temporarily unavailable");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn verbatim_policy_returns_raw_text() {
        let p = provider(Some(connection_refused as fn() -> UpstreamError));
        let service = PortfolioService::new(p, ErrorExposure::Verbatim);
        match service.get_portfolio(None, None).await {
            Err(ApiError::Upstream(detail)) => {
                assert!(detail.contains("10.9.8.7:5000"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
