use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Balance, CreateCredential, Credential, LoadBalanceMode, VerifyOutcome};
use super::{PoolApi, UpstreamError};

/// HTTP client for the pool-core API.
///
/// Authenticates with a static service token; the per-credential Kiro auth
/// dance happens entirely inside the core.
pub struct PoolClient {
    http: reqwest::Client,
    base_url: String,
    service_token: String,
}

impl PoolClient {
    pub fn new(base_url: &str, service_token: &str, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_token: service_token.to_string(),
        }
    }

    fn credential_url(&self, id: &str) -> String {
        format!(
            "{}/api/credentials/{}",
            self.base_url,
            urlencoding::encode(id)
        )
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_token)) {
            headers.insert("authorization", value);
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers
    }

    /// Map a non-success response into the matching [`UpstreamError`].
    async fn error_for(resp: reqwest::Response, id: Option<&str>) -> UpstreamError {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return UpstreamError::Unauthorized;
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return UpstreamError::NotFound(id.to_string());
            }
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return parse_rate_limit(resp.headers());
        }

        let message = resp.text().await.unwrap_or_default();
        UpstreamError::Api {
            status: status.as_u16(),
            message,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        id: Option<&str>,
    ) -> Result<T, UpstreamError> {
        let resp = self
            .http
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(UpstreamError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, id).await);
        }

        resp.json::<T>()
            .await
            .map_err(|e| UpstreamError::ResponseParsing(format!("{url}: {e}")))
    }

    /// Issue a bodyless request (DELETE / enable / disable / mode set) and
    /// discard the response body.
    async fn send_empty(
        &self,
        req: reqwest::RequestBuilder,
        id: Option<&str>,
    ) -> Result<(), UpstreamError> {
        let resp = req
            .headers(self.headers())
            .send()
            .await
            .map_err(UpstreamError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, id).await);
        }
        Ok(())
    }
}

#[async_trait]
impl PoolApi for PoolClient {
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
        let url = format!("{}/api/credentials", self.base_url);
        self.get_json(&url, None).await
    }

    async fn create_credential(
        &self,
        req: &CreateCredential,
    ) -> Result<Credential, UpstreamError> {
        let url = format!("{}/api/credentials", self.base_url);
        let resp = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(req)
            .send()
            .await
            .map_err(UpstreamError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, None).await);
        }

        resp.json::<Credential>()
            .await
            .map_err(|e| UpstreamError::ResponseParsing(format!("create credential: {e}")))
    }

    async fn delete_credential(&self, id: &str) -> Result<(), UpstreamError> {
        debug!(credential = %id, "Deleting credential");
        let url = self.credential_url(id);
        self.send_empty(self.http.delete(&url), Some(id)).await
    }

    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<(), UpstreamError> {
        debug!(credential = %id, disabled, "Toggling credential");
        let action = if disabled { "disable" } else { "enable" };
        let url = format!("{}/{action}", self.credential_url(id));
        self.send_empty(self.http.post(&url), Some(id)).await
    }

    async fn verify_credential(&self, id: &str) -> Result<VerifyOutcome, UpstreamError> {
        let url = format!("{}/verify", self.credential_url(id));
        let resp = self
            .http
            .post(&url)
            .headers(self.headers())
            .send()
            .await
            .map_err(UpstreamError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, Some(id)).await);
        }

        resp.json::<VerifyOutcome>()
            .await
            .map_err(|e| UpstreamError::ResponseParsing(format!("verify {id}: {e}")))
    }

    async fn fetch_balance(&self, id: &str) -> Result<Balance, UpstreamError> {
        let url = format!("{}/balance", self.credential_url(id));
        self.get_json(&url, Some(id)).await
    }

    async fn get_balance_mode(&self) -> Result<LoadBalanceMode, UpstreamError> {
        #[derive(serde::Deserialize)]
        struct ModeBody {
            mode: LoadBalanceMode,
        }

        let url = format!("{}/api/settings/balancing", self.base_url);
        let body: ModeBody = self.get_json(&url, None).await?;
        Ok(body.mode)
    }

    async fn set_balance_mode(&self, mode: LoadBalanceMode) -> Result<(), UpstreamError> {
        let url = format!("{}/api/settings/balancing", self.base_url);
        let resp = self
            .http
            .put(&url)
            .headers(self.headers())
            .json(&serde_json::json!({ "mode": mode }))
            .send()
            .await
            .map_err(UpstreamError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, None).await);
        }
        Ok(())
    }
}

/// Parse an [`UpstreamError::RateLimited`] from a 429 response's headers.
fn parse_rate_limit(headers: &reqwest::header::HeaderMap) -> UpstreamError {
    let retry_after_secs = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);
    UpstreamError::RateLimited { retry_after_secs }
}
