//! Ephemeral client-local session context.
//!
//! Correlates the registration and verification steps within one client
//! session. No server-issued ticket exists; the email written here is the
//! only link between the two coordinators.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

const EMAIL_KEY: &str = "registrationEmail";
const NAME_KEY: &str = "registrationName";

/// Key/value bag shared between the workflow steps.
#[derive(Debug, Default)]
pub struct SessionContext {
    values: Mutex<HashMap<String, String>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set_email(&self, email: &str) {
        self.set(EMAIL_KEY, email);
    }

    /// Email of the pending registration, if one was submitted. Empty values
    /// count as absent.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.get(EMAIL_KEY).filter(|email| !email.is_empty())
    }

    pub fn set_name(&self, name: &str) {
        self.set(NAME_KEY, name);
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.get(NAME_KEY)
    }

    /// Drop everything stored in the session.
    pub fn clear(&self) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
