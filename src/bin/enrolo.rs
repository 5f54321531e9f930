use anyhow::Result;
use enrolo::cli::{actions, actions::Action, start, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let action = start()?;

    // Handle the action
    match action {
        Action::Register { .. } => actions::register::handle(action).await?,
        Action::Verify { .. } => actions::verify::handle(action).await?,
        Action::Resend { .. } => actions::resend::handle(action).await?,
        Action::Server { .. } => actions::server::handle(action).await?,
    }

    telemetry::shutdown_tracer();

    Ok(())
}
