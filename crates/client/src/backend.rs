//! Billing boundary as seen from the client
//!
//! [`SubscriptionBackend`] is the port the store and remediation actions call;
//! [`HttpBackend`] implements it against the Petsit API.

use async_trait::async_trait;
use petsit_shared::{CheckSubscriptionResponse, CreateCheckoutRequest, HostedUrlResponse};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::session::Session;

/// Calls into the billing boundary on behalf of a session
#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn check_subscription(
        &self,
        session: &Session,
    ) -> Result<CheckSubscriptionResponse, BackendError>;

    /// Hosted checkout URL for a plan price
    async fn create_checkout(&self, session: &Session, price_id: &str)
        -> Result<String, BackendError>;

    /// Hosted self-service billing portal URL
    async fn customer_portal(&self, session: &Session) -> Result<String, BackendError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)] // Part of the envelope; only the message is surfaced
    code: String,
    message: String,
}

/// [`SubscriptionBackend`] over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn post(&self, path: &str, session: &Session) -> RequestBuilder {
        self.client
            .post(format!("{}/api/v1/{}", self.base_url, path))
            .bearer_auth(&session.access_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Billing request failed");
            BackendError::Unavailable(e.to_string())
        })?;

        let response = Self::check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                BackendError::Unavailable(format!("{}: {}", s.as_u16(), message))
            }
            s => BackendError::Rejected {
                status: s.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl SubscriptionBackend for HttpBackend {
    async fn check_subscription(
        &self,
        session: &Session,
    ) -> Result<CheckSubscriptionResponse, BackendError> {
        self.send(self.post("check-subscription", session)).await
    }

    async fn create_checkout(
        &self,
        session: &Session,
        price_id: &str,
    ) -> Result<String, BackendError> {
        let body = CreateCheckoutRequest {
            price_id: price_id.to_string(),
        };
        let response: HostedUrlResponse = self
            .send(self.post("create-checkout", session).json(&body))
            .await?;
        Ok(response.url)
    }

    async fn customer_portal(&self, session: &Session) -> Result<String, BackendError> {
        let response: HostedUrlResponse = self.send(self.post("customer-portal", session)).await?;
        Ok(response.url)
    }
}
