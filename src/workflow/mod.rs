//! Registration and OTP email-verification workflow.
//!
//! The workflow is client-driven: [`RegistrationCoordinator`] creates a
//! pending application on the remote store and seeds a [`SessionContext`],
//! then [`VerificationCoordinator`] reads that context, checks the passcode
//! the registrant typed, and hands off to the external destination.

use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

pub mod otp;
pub mod registration;
pub mod session;
pub mod verification;

pub use registration::{RegistrationCoordinator, RegistrationRequest};
pub use session::SessionContext;
pub use verification::{VerificationCoordinator, VerifyState};

/// Delay before a scheduled navigation or redirect fires.
pub const HANDOFF_DELAY: Duration = Duration::from_secs(2);

/// External destination reached after a successful verification. The verified
/// email is appended as a query parameter.
pub const DEFAULT_REDIRECT_URL: &str = "https://ebank.enrolo.dev/signup";

/// Input problems caught before any network call. Messages are shown to the
/// registrant as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("First name is required")]
    MissingFirstName,
    #[error("Last name is required")]
    MissingLastName,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Referral code must be 4-12 alphanumeric characters with at least one letter")]
    InvalidReferralCode,
    #[error("Please enter a valid 6-digit OTP")]
    InvalidOtpFormat,
    #[error("Email address not found. Please go back to registration.")]
    MissingEmail,
}

/// Failure taxonomy for the workflow: validation (pre-network), remote
/// (non-2xx with an optional `message` body), transport, plus the re-entry
/// guard.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{}", message.as_deref().unwrap_or("application store request failed"))]
    Remote {
        status: reqwest::StatusCode,
        message: Option<String>,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid store endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("another request is already in flight")]
    Busy,
}

impl WorkflowError {
    /// Message surfaced to the registrant: validation and remote-reported
    /// messages verbatim, everything else the caller-provided fallback.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Busy => self.to_string(),
            Self::Remote { .. } | Self::Transport(_) | Self::Endpoint(_) => fallback.to_string(),
        }
    }
}

/// Seam for client-side navigation and the final external redirect.
pub trait Navigator: Send + Sync {
    /// Navigate back to the registration step.
    fn to_registration(&self);
    /// Advance to the verification step.
    fn to_verification(&self);
    /// Leave the workflow for the external destination.
    fn external_redirect(&self, url: &Url);
}

/// Navigator that only logs; used by the CLI where there is no page to move.
#[derive(Clone, Copy, Debug)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn to_registration(&self) {
        info!("navigating to the registration step");
    }

    fn to_verification(&self) {
        info!("navigating to the verification step");
    }

    fn external_redirect(&self, url: &Url) {
        info!(%url, "redirecting to the external destination");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Navigator;
    use std::sync::Mutex;
    use url::Url;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum NavEvent {
        Registration,
        Verification,
        Redirect(String),
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingNavigator {
        events: Mutex<Vec<NavEvent>>,
    }

    impl RecordingNavigator {
        pub(crate) fn events(&self) -> Vec<NavEvent> {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }

        fn record(&self, event: NavEvent) {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event);
        }
    }

    impl Navigator for RecordingNavigator {
        fn to_registration(&self) {
            self.record(NavEvent::Registration);
        }

        fn to_verification(&self) {
            self.record(NavEvent::Verification);
        }

        fn external_redirect(&self, url: &Url) {
            self.record(NavEvent::Redirect(url.to_string()));
        }
    }
}
