use crate::cli::actions::Action;
use crate::store::StoreClient;
use crate::workflow::{
    LogNavigator, Navigator, SessionContext, VerificationCoordinator, VerifyState,
    DEFAULT_REDIRECT_URL,
};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use url::Url;

/// Handle the resend action: issue a new passcode for a pending record.
/// # Errors
/// Returns an error if the store rejects the resend or the request fails.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Resend { email, store_url } = action else {
        return Err(anyhow!("unexpected action"));
    };

    let store = StoreClient::new(store_url)?;
    let session = Arc::new(SessionContext::new());
    session.set_email(&email);
    let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);

    // A resend never redirects; the default destination is only a
    // placeholder for the coordinator.
    let redirect_url = Url::parse(DEFAULT_REDIRECT_URL)?;
    let Some(mut coordinator) =
        VerificationCoordinator::enter(store, session, navigator, redirect_url)
    else {
        return Err(anyhow!("no pending registration for this session"));
    };

    match coordinator.resend().await {
        VerifyState::Idle {
            notice: Some(notice),
        } => {
            println!("{notice}");
            Ok(())
        }
        VerifyState::Error { message } => Err(anyhow!(message.clone())),
        _ => Ok(()),
    }
}
