use crate::cli::actions::Action;
use crate::store::{ApplicationStatus, StoreClient};
use crate::workflow::verification::VERIFIED_MESSAGE;
use crate::workflow::{
    LogNavigator, Navigator, SessionContext, VerificationCoordinator, VerifyState,
};
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Handle the verify action: one-shot when a code was given, interactive
/// otherwise.
/// # Errors
/// Returns an error if the passcode is rejected or a request fails.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Verify {
        email,
        code,
        store_url,
        redirect_url,
    } = action
    else {
        return Err(anyhow!("unexpected action"));
    };

    let store = StoreClient::new(store_url)?;
    let session = Arc::new(SessionContext::new());
    session.set_email(&email);
    let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);

    let Some(mut coordinator) =
        VerificationCoordinator::enter(store.clone(), session, navigator, redirect_url)
    else {
        return Err(anyhow!("no pending registration for this session"));
    };

    match code {
        Some(code) => {
            let state = coordinator.submit(&code).await.clone();
            finish(&mut coordinator, &store, &state).await
        }
        None => run_verification(coordinator, &store).await,
    }
}

/// Interactive passcode entry; typing "resend" asks the store for a new
/// code.
/// # Errors
/// Returns an error if reading stdin or the final reconciliation fails.
pub async fn run_verification(
    mut coordinator: VerificationCoordinator,
    store: &StoreClient,
) -> Result<()> {
    println!(
        "Enter the 6-digit code sent to {} (or \"resend\"):",
        coordinator.email()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let state = if input.eq_ignore_ascii_case("resend") {
            coordinator.resend().await.clone()
        } else {
            coordinator.submit(input).await.clone()
        };

        match &state {
            VerifyState::Success { .. } => return finish(&mut coordinator, store, &state).await,
            VerifyState::Idle {
                notice: Some(notice),
            } => println!("{notice}"),
            VerifyState::Error { message } => println!("{message}"),
            VerifyState::Idle { notice: None } | VerifyState::Loading => {}
        }
    }

    Ok(())
}

async fn finish(
    coordinator: &mut VerificationCoordinator,
    store: &StoreClient,
    state: &VerifyState,
) -> Result<()> {
    match state {
        VerifyState::Success { email } => {
            println!("{VERIFIED_MESSAGE}");

            // Reconcile the outcome into the durable record store.
            let ack = store
                .update_status(email, ApplicationStatus::Verified, Some(Utc::now()))
                .await?;
            info!(status = ack.status.as_str(), "verification reconciled");

            if let Some(redirect) = coordinator.take_redirect() {
                let _ = redirect.await;
            }
            Ok(())
        }
        VerifyState::Error { message } => Err(anyhow!(message.clone())),
        VerifyState::Idle {
            notice: Some(notice),
        } => {
            println!("{notice}");
            Ok(())
        }
        VerifyState::Idle { notice: None } | VerifyState::Loading => Ok(()),
    }
}
