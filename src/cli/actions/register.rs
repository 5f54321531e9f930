use crate::cli::actions::{verify::run_verification, Action};
use crate::store::StoreClient;
use crate::workflow::registration::REGISTRATION_FALLBACK;
use crate::workflow::{
    LogNavigator, Navigator, RegistrationCoordinator, RegistrationRequest, SessionContext,
    VerificationCoordinator,
};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Handle the register action: submit the application, then walk the same
/// session through passcode verification.
/// # Errors
/// Returns an error if validation, the submit, or verification fails.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Register {
        first_name,
        last_name,
        email,
        referral_code,
        store_url,
        redirect_url,
    } = action
    else {
        return Err(anyhow!("unexpected action"));
    };

    let store = StoreClient::new(store_url)?;
    let session = Arc::new(SessionContext::new());
    let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);

    let mut coordinator =
        RegistrationCoordinator::new(store.clone(), Arc::clone(&session), Arc::clone(&navigator));
    let request = RegistrationRequest {
        first_name,
        last_name,
        email,
        referral_code,
    };

    match coordinator.register(&request).await {
        Ok(message) => println!("{message}"),
        Err(err) => return Err(anyhow!(err.user_message(REGISTRATION_FALLBACK))),
    }

    // Wait out the scheduled hand-off so the step order matches the page
    // flow.
    if let Some(handoff) = coordinator.take_handoff() {
        let _ = handoff.await;
    }
    drop(coordinator);

    let Some(verification) =
        VerificationCoordinator::enter(store.clone(), session, navigator, redirect_url)
    else {
        return Err(anyhow!("no pending registration in this session"));
    };

    run_verification(verification, &store).await
}
