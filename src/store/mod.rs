//! HTTP client for the remote application store.
//!
//! The store sits behind three idempotent-by-key POST JSON endpoints:
//! `submit-application`, `verify-otp` and `update-status`. Non-2xx responses
//! carry an optional `{"message": ...}` body which is surfaced verbatim to
//! the registrant.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use url::Url;

use crate::workflow::WorkflowError;
use crate::APP_USER_AGENT;

pub mod types;

pub use types::{ApplicationStatus, SubmitApplication, UpdateStatus, UpdateStatusAck, VerifyOtp};

/// Client for the three application store endpoints, rooted at one base URL.
#[derive(Clone, Debug)]
pub struct StoreClient {
    base_url: Url,
    client: Client,
}

impl StoreClient {
    /// Build a client for the store at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, WorkflowError> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, WorkflowError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/{path}"))?;

        debug!("endpoint URL: {}", url);

        Ok(url)
    }

    async fn post<T: Serialize>(
        &self,
        operation: &'static str,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, WorkflowError> {
        let url = self.endpoint(path)?;

        let span = info_span!(
            "store.request",
            otel.name = operation,
            http.method = "POST",
            url = %url
        );
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .instrument(span)
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Remote-reported errors carry a message body; keep it if present.
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|json| json.get("message").and_then(Value::as_str).map(String::from));

        Err(WorkflowError::Remote { status, message })
    }

    /// Upsert an application record keyed by email. The store delivers the
    /// passcode to the registrant out of band.
    ///
    /// # Errors
    /// Returns an error on a non-2xx response or a transport failure.
    pub async fn submit_application(
        &self,
        application: &SubmitApplication,
    ) -> Result<(), WorkflowError> {
        self.post("store.submit_application", "submit-application", application)
            .await
            .map(|_| ())
    }

    /// Check `code` against the current passcode for `email`. The store also
    /// enforces the 15-minute expiry.
    ///
    /// # Errors
    /// Returns an error if the code is rejected or the request fails.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), WorkflowError> {
        let payload = VerifyOtp {
            email: email.to_string(),
            otp: code.to_string(),
        };

        self.post("store.verify_otp", "verify-otp", &payload)
            .await
            .map(|_| ())
    }

    /// Reconcile a verification into the durable record store. Idempotent
    /// under repeated calls with the same arguments.
    ///
    /// # Errors
    /// Returns an error on a non-2xx response, a transport failure, or an
    /// unparseable acknowledgement body.
    pub async fn update_status(
        &self,
        email: &str,
        status: ApplicationStatus,
        verified_at: Option<DateTime<Utc>>,
    ) -> Result<UpdateStatusAck, WorkflowError> {
        let payload = UpdateStatus {
            email: email.to_string(),
            status,
            verified_at,
        };

        let response = self
            .post("store.update_status", "update-status", &payload)
            .await?;

        Ok(response.json().await?)
    }
}
