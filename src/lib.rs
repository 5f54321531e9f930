//! # Enrolo (Registration & Email Verification)
//!
//! `enrolo` drives the registration and one-time-passcode (OTP) email
//! verification workflow against a remote application store.
//!
//! ## Workflow
//!
//! Registration validates the registrant's input, mints a fresh 6-digit
//! passcode, and submits a pending application keyed by email. The store
//! delivers the passcode out of band; the verification step checks the code
//! the registrant typed and, on success, hands off to the external banking
//! destination.
//!
//! - **Passcodes:** exactly 6 ASCII digits, valid for 15 minutes. Issuing a
//!   new passcode for an email supersedes the previous one.
//! - **Correlation:** the two steps are linked by an ephemeral
//!   [`workflow::SessionContext`], not by a server-issued ticket.
//! - **Hand-offs:** scheduled navigations (2 seconds) are cancellable tasks
//!   tied to the owning coordinator's lifetime.
//!
//! ## Update-status service
//!
//! The crate also ships the small `update-status` reconciliation endpoint the
//! workflow's backend exposes, served over axum with a permissive CORS layer
//! so cross-origin pages can reach it.

pub mod api;
pub mod cli;
pub mod store;
pub mod workflow;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
