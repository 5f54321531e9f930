//! Wire types for the application store endpoints. All bodies are camelCase
//! JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::otp::OneTimePasscode;
use crate::workflow::RegistrationRequest;

/// Lifecycle of an application record. Only `pending -> verified` is
/// exercised by the workflow; `rejected` exists in the record schema but no
/// transition here produces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Verified,
    Rejected,
}

impl ApplicationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

/// Body of `POST submit-application`. The store upserts by email; with
/// `resend: true` only the passcode and its issuance clock are replaced.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    pub otp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resend: Option<bool>,
}

impl SubmitApplication {
    /// Full payload for the initial registration submit.
    #[must_use]
    pub fn registration(request: &RegistrationRequest, passcode: &OneTimePasscode) -> Self {
        Self {
            first_name: Some(request.first_name.clone()),
            last_name: Some(request.last_name.clone()),
            email: request.email.clone(),
            referral_code: Some(request.referral_code.clone()),
            otp: passcode.code().to_string(),
            status: Some(ApplicationStatus::Pending),
            created_at: Some(passcode.issued_at()),
            resend: None,
        }
    }

    /// Passcode-only payload for a resend; overwrites the current passcode of
    /// the existing record.
    #[must_use]
    pub fn resend(passcode: &OneTimePasscode) -> Self {
        Self {
            first_name: None,
            last_name: None,
            email: passcode.email().to_string(),
            referral_code: None,
            otp: passcode.code().to_string(),
            status: None,
            created_at: None,
            resend: Some(true),
        }
    }
}

/// Body of `POST verify-otp`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtp {
    pub email: String,
    pub otp: String,
}

/// Body of `POST update-status`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub email: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Success body returned by `POST update-status`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusAck {
    pub message: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub updated_at: String,
}
