//! Verification step: a small state machine around passcode entry, resend,
//! and the final external redirect.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, instrument};
use url::Url;

use crate::store::{StoreClient, SubmitApplication};
use crate::workflow::otp::{self, OneTimePasscode};
use crate::workflow::{Navigator, SessionContext, ValidationError, HANDOFF_DELAY};

/// Shown after a successful verification.
pub const VERIFIED_MESSAGE: &str = "Email verified successfully!";

/// Notice shown after a resend lands the machine back in `Idle`.
const RESEND_NOTICE: &str = "New OTP sent! Please check your email.";

const VERIFY_FALLBACK: &str = "An error occurred during verification. Please try again.";
const RESEND_FALLBACK: &str = "Failed to resend OTP. Please try again.";

/// Verification state. The message payloads live only in the variants that
/// carry them, so illegal combinations are unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyState {
    /// Resting state; also reached again after a successful resend.
    Idle { notice: Option<String> },
    /// A network call is outstanding; no transition leaves this state except
    /// by response or error.
    Loading,
    /// The email is verified and exactly one redirect has been scheduled.
    Success { email: String },
    Error { message: String },
}

impl VerifyState {
    /// Message to surface for the current state, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Idle { notice } => notice.as_deref(),
            Self::Loading => None,
            Self::Success { .. } => Some(VERIFIED_MESSAGE),
            Self::Error { message } => Some(message),
        }
    }
}

/// Drives passcode verification for the email seeded by registration.
///
/// Scheduled redirects are cancelled when the coordinator is dropped or the
/// registrant navigates away.
pub struct VerificationCoordinator {
    store: StoreClient,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    redirect_url: Url,
    redirect_delay: Duration,
    email: String,
    state: VerifyState,
    redirect: Option<JoinHandle<()>>,
}

impl VerificationCoordinator {
    /// Enter the verification step.
    ///
    /// Without an email in the session context the step is unreachable: the
    /// navigator is sent back to registration and no coordinator is built.
    #[must_use]
    pub fn enter(
        store: StoreClient,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
        redirect_url: Url,
    ) -> Option<Self> {
        let Some(email) = session.email() else {
            navigator.to_registration();
            return None;
        };

        Some(Self {
            store,
            session,
            navigator,
            redirect_url,
            redirect_delay: HANDOFF_DELAY,
            email,
            state: VerifyState::Idle { notice: None },
            redirect: None,
        })
    }

    #[must_use]
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn state(&self) -> &VerifyState {
        &self.state
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Submit the passcode the registrant typed.
    ///
    /// Only `Idle` and `Error` accept a submit; `Loading` and `Success` are
    /// terminal for this operation and the call is a no-op. A code that is
    /// not exactly 6 digits is rejected without any network call.
    #[instrument(skip_all, fields(email = %self.email))]
    pub async fn submit(&mut self, code: &str) -> &VerifyState {
        if matches!(
            self.state,
            VerifyState::Loading | VerifyState::Success { .. }
        ) {
            return &self.state;
        }

        if !otp::is_valid_code(code) {
            self.state = VerifyState::Error {
                message: ValidationError::InvalidOtpFormat.to_string(),
            };
            return &self.state;
        }

        self.state = VerifyState::Loading;

        match self.store.verify_otp(&self.email, code).await {
            Ok(()) => {
                self.state = VerifyState::Success {
                    email: self.email.clone(),
                };
                self.schedule_redirect();
            }
            Err(err) => {
                error!("OTP verification failed: {err}");
                self.state = VerifyState::Error {
                    message: err.user_message(VERIFY_FALLBACK),
                };
            }
        }

        &self.state
    }

    /// Issue a new passcode for the pending application.
    ///
    /// The new code overwrites the store's current one and resets its
    /// issuance clock; on success the machine returns to `Idle` with a
    /// notice. Like `submit`, this is a no-op from `Loading` or `Success`.
    #[instrument(skip_all)]
    pub async fn resend(&mut self) -> &VerifyState {
        if matches!(
            self.state,
            VerifyState::Loading | VerifyState::Success { .. }
        ) {
            return &self.state;
        }

        // Re-read the session: the correlation may have been lost since
        // entry, and a resend without an email has nowhere to go.
        let Some(email) = self.session.email() else {
            self.state = VerifyState::Error {
                message: ValidationError::MissingEmail.to_string(),
            };
            return &self.state;
        };

        self.state = VerifyState::Loading;

        let passcode = OneTimePasscode::issue(&email);
        match self
            .store
            .submit_application(&SubmitApplication::resend(&passcode))
            .await
        {
            Ok(()) => {
                self.state = VerifyState::Idle {
                    notice: Some(RESEND_NOTICE.to_string()),
                };
            }
            Err(err) => {
                error!("resend failed: {err}");
                self.state = VerifyState::Error {
                    message: err.user_message(RESEND_FALLBACK),
                };
            }
        }

        &self.state
    }

    /// Abandon verification and navigate back to registration. The pending
    /// application record is left behind on the store.
    pub fn back_to_registration(&mut self) {
        if let Some(handle) = self.redirect.take() {
            handle.abort();
        }
        self.navigator.to_registration();
    }

    fn schedule_redirect(&mut self) {
        let mut url = self.redirect_url.clone();
        url.query_pairs_mut().append_pair("email", &self.email);

        let navigator = Arc::clone(&self.navigator);
        let delay = self.redirect_delay;
        self.redirect = Some(tokio::spawn(async move {
            sleep(delay).await;
            navigator.external_redirect(&url);
        }));
    }

    /// Hand the scheduled redirect to the caller, e.g. to await it.
    pub fn take_redirect(&mut self) -> Option<JoinHandle<()>> {
        self.redirect.take()
    }
}

impl Drop for VerificationCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.redirect.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::{NavEvent, RecordingNavigator};
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REDIRECT_URL: &str = "https://ebank.example.com/signup";

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn enter(
        server: &MockServer,
    ) -> Result<(
        VerificationCoordinator,
        Arc<SessionContext>,
        Arc<RecordingNavigator>,
    )> {
        let store = StoreClient::new(Url::parse(&server.uri())?)?;
        let session = Arc::new(SessionContext::new());
        session.set_email("jane@example.com");
        let navigator = Arc::new(RecordingNavigator::default());
        let coordinator = VerificationCoordinator::enter(
            store,
            Arc::clone(&session),
            navigator.clone(),
            Url::parse(REDIRECT_URL)?,
        )
        .ok_or_else(|| anyhow!("entry guard tripped unexpectedly"))?
        .with_redirect_delay(Duration::from_millis(10));
        Ok((coordinator, session, navigator))
    }

    #[tokio::test]
    async fn entry_without_email_navigates_back() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let store = StoreClient::new(Url::parse(&server.uri())?)?;
        let session = Arc::new(SessionContext::new());
        let navigator = Arc::new(RecordingNavigator::default());

        let coordinator = VerificationCoordinator::enter(
            store,
            session,
            navigator.clone(),
            Url::parse(REDIRECT_URL)?,
        );

        assert!(coordinator.is_none());
        assert_eq!(navigator.events(), vec![NavEvent::Registration]);
        Ok(())
    }

    #[tokio::test]
    async fn short_code_is_rejected_without_network_call() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut coordinator, _, _) = enter(&server)?;
        let state = coordinator.submit("1234").await;

        assert_eq!(
            state,
            &VerifyState::Error {
                message: "Please enter a valid 6-digit OTP".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn successful_verification_schedules_one_redirect() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify-otp"))
            .and(body_partial_json(json!({
                "email": "jane@example.com",
                "otp": "123456"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (mut coordinator, _, navigator) = enter(&server)?;

        let state = coordinator.submit("123456").await.clone();
        assert_eq!(
            state,
            VerifyState::Success {
                email: "jane@example.com".to_string()
            }
        );

        // Success is terminal: another submit is a no-op and must not
        // schedule a second redirect.
        let state = coordinator.submit("123456").await;
        assert!(matches!(state, VerifyState::Success { .. }));

        let redirect = coordinator
            .take_redirect()
            .ok_or_else(|| anyhow!("redirect not scheduled"))?;
        redirect.await?;
        assert!(coordinator.take_redirect().is_none());

        let events = navigator.events();
        assert_eq!(
            events,
            vec![NavEvent::Redirect(
                "https://ebank.example.com/signup?email=jane%40example.com".to_string()
            )]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_verification_surfaces_store_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify-otp"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "Invalid OTP. Please try again."
            })))
            .mount(&server)
            .await;

        let (mut coordinator, _, _) = enter(&server)?;
        let state = coordinator.submit("123456").await;

        assert_eq!(
            state,
            &VerifyState::Error {
                message: "Invalid OTP. Please try again.".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() -> Result<()> {
        let store = StoreClient::new(Url::parse("http://127.0.0.1:1")?)?;
        let session = Arc::new(SessionContext::new());
        session.set_email("jane@example.com");
        let navigator = Arc::new(RecordingNavigator::default());
        let mut coordinator =
            VerificationCoordinator::enter(store, session, navigator, Url::parse(REDIRECT_URL)?)
                .ok_or_else(|| anyhow!("entry guard tripped unexpectedly"))?;

        let state = coordinator.submit("123456").await;
        assert_eq!(
            state,
            &VerifyState::Error {
                message: VERIFY_FALLBACK.to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn resend_returns_to_idle_with_notice() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit-application"))
            .and(body_partial_json(json!({
                "email": "jane@example.com",
                "resend": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (mut coordinator, _, _) = enter(&server)?;
        let state = coordinator.resend().await;

        assert_eq!(
            state,
            &VerifyState::Idle {
                notice: Some(RESEND_NOTICE.to_string())
            }
        );

        // The resent passcode is a fresh 6-digit code.
        let requests = server
            .received_requests()
            .await
            .ok_or_else(|| anyhow!("requests not recorded"))?;
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
        let otp = body["otp"]
            .as_str()
            .ok_or_else(|| anyhow!("otp missing"))?;
        assert_eq!(otp.len(), 6);
        assert!(otp.bytes().all(|b| b.is_ascii_digit()));
        assert!(body.get("firstName").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn resend_without_session_email_fails_without_network_call() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut coordinator, session, _) = enter(&server)?;
        session.clear();

        let state = coordinator.resend().await;
        assert_eq!(
            state,
            &VerifyState::Error {
                message: "Email address not found. Please go back to registration.".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn resend_from_success_is_a_no_op() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify-otp"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/submit-application"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut coordinator, _, _) = enter(&server)?;
        coordinator.submit("123456").await;

        let state = coordinator.resend().await;
        assert!(matches!(state, VerifyState::Success { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn back_to_registration_cancels_pending_redirect() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify-otp"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (mut coordinator, _, navigator) = enter(&server)?;
        coordinator.submit("123456").await;
        coordinator.back_to_registration();

        sleep(Duration::from_millis(30)).await;
        assert_eq!(navigator.events(), vec![NavEvent::Registration]);
        Ok(())
    }
}
