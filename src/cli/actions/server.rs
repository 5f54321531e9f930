use crate::{api, cli::actions::Action};
use anyhow::{anyhow, Result};

/// Handle the server action
/// # Errors
/// Returns an error if the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server { port } = action else {
        return Err(anyhow!("unexpected action"));
    };

    api::new(port).await
}
