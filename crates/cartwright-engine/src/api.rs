//! Thin HTTP helper used for suite setup and teardown.

use crate::data::{User, users};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Status and body of an API call. Non-2xx statuses are not errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct ApiHelper {
    client: Client,
    base_url: Url,
}

impl ApiHelper {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, ApiError> {
        let body = json!({ "username": username, "password": password });
        self.send(Method::POST, "/login", Some(body)).await
    }

    /// Log in as the standard user.
    pub async fn login_default(&self) -> Result<ApiResponse, ApiError> {
        let User { username, password } = users::STANDARD;
        self.login(username, password).await
    }

    pub async fn add_to_cart(&self, product_id: &str) -> Result<ApiResponse, ApiError> {
        let path = format!("/cart/{}", product_id);
        self.send(Method::POST, &path, Some(json!({}))).await
    }

    pub async fn remove_from_cart(&self, product_id: &str) -> Result<ApiResponse, ApiError> {
        let path = format!("/cart/{}", product_id);
        self.send(Method::DELETE, &path, None).await
    }

    pub async fn get_cart(&self) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, "/cart", None).await
    }

    pub async fn clear_cart(&self) -> Result<ApiResponse, ApiError> {
        self.send(Method::DELETE, "/cart", None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.base_url.join(path)?;
        debug!("API {} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
