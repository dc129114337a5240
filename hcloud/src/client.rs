//! hcloud REST client

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud/v1";

/// Generic HTTP verbs against the hcloud REST API.
///
/// Resource managers consume this trait instead of [`HetznerClient`] directly
/// so request traffic can be captured by a recording client in tests.
#[allow(async_fn_in_trait)]
pub trait Api {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError>;

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned;

    /// Delete the resource `{path}/{id}`.
    async fn delete(&self, path: &str, id: u64) -> Result<(), ApiError>;
}

/// Hetzner Cloud API client
pub struct HetznerClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HetznerClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a non-default endpoint (staging, local stub)
    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the body, rejecting non-success statuses with status and body text
    async fn check(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text().await?)
    }
}

impl Api for HetznerClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!("GET {path}");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = Self::check(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {path}");
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let body = Self::check(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete(&self, path: &str, id: u64) -> Result<(), ApiError> {
        debug!("DELETE {path}/{id}");
        let response = self
            .client
            .delete(format!("{}/{id}", self.url(path)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_composition() {
        let client = HetznerClient::with_base_url(
            "token".to_string(),
            "https://api.example.com/v1".to_string(),
        );
        assert_eq!(client.url("/firewalls"), "https://api.example.com/v1/firewalls");
    }

    #[test]
    fn test_default_base_url() {
        let client = HetznerClient::new("token".to_string());
        assert_eq!(client.url("/firewalls"), "https://api.hetzner.cloud/v1/firewalls");
    }
}
