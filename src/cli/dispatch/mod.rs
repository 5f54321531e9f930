use crate::cli::actions::Action;
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use url::Url;

fn required_string(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(String::to_string)
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

fn required_url(matches: &ArgMatches, name: &str) -> Result<Url> {
    let raw = required_string(matches, name)?;
    Url::parse(&raw).with_context(|| format!("invalid URL for --{name}: {raw}"))
}

pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("register", sub)) => Ok(Action::Register {
            first_name: required_string(sub, "first-name")?,
            last_name: required_string(sub, "last-name")?,
            email: required_string(sub, "email")?,
            referral_code: required_string(sub, "referral-code")?,
            store_url: required_url(sub, "store-url")?,
            redirect_url: required_url(sub, "redirect-url")?,
        }),
        Some(("verify", sub)) => Ok(Action::Verify {
            email: required_string(sub, "email")?,
            code: sub.get_one::<String>("code").map(String::to_string),
            store_url: required_url(sub, "store-url")?,
            redirect_url: required_url(sub, "redirect-url")?,
        }),
        Some(("resend", sub)) => Ok(Action::Resend {
            email: required_string(sub, "email")?,
            store_url: required_url(sub, "store-url")?,
        }),
        Some(("server", sub)) => Ok(Action::Server {
            port: sub.get_one::<u16>("port").copied().unwrap_or(8080),
        }),
        _ => Err(anyhow!("no subcommand provided")),
    }
}
