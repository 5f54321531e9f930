//! One-time passcode issuance.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Passcodes are exactly this many ASCII digits.
pub const OTP_DIGITS: usize = 6;

/// Minutes a passcode stays valid after issuance.
pub const OTP_TTL_MINUTES: i64 = 15;

/// A 6-digit passcode scoped to one email address.
///
/// Issuing a new passcode for the same email supersedes the previous one, so
/// no collision avoidance is needed across issuances.
#[derive(Clone, Debug)]
pub struct OneTimePasscode {
    email: String,
    code: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl OneTimePasscode {
    /// Issue a fresh passcode for `email`, valid for 15 minutes.
    #[must_use]
    pub fn issue(email: &str) -> Self {
        // 100000..=999999 keeps the leading digit non-zero, always 6 digits.
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        let issued_at = Utc::now();

        Self {
            email: email.to_string(),
            code,
            issued_at,
            expires_at: issued_at + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Expiry enforcement lives on the store; this mirrors the same rule.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Check that `code` is exactly 6 ASCII digits.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    code.len() == OTP_DIGITS && code.bytes().all(|byte| byte.is_ascii_digit())
}
