use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    builder::ValueParser,
    Arg, ColorChoice, Command,
};

use crate::workflow::DEFAULT_REDIRECT_URL;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn store_url_arg() -> Arg {
    Arg::new("store-url")
        .short('s')
        .long("store-url")
        .help("Base URL of the application store endpoints")
        .env("ENROLO_STORE_URL")
        .required(true)
}

fn redirect_url_arg() -> Arg {
    Arg::new("redirect-url")
        .long("redirect-url")
        .help("External destination reached after a successful verification")
        .env("ENROLO_REDIRECT_URL")
        .default_value(DEFAULT_REDIRECT_URL)
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Email address of the registrant")
        .required(true)
}

fn register_command() -> Command {
    Command::new("register")
        .about("Submit a registration and start email verification")
        .arg(
            Arg::new("first-name")
                .long("first-name")
                .help("First name of the registrant")
                .required(true),
        )
        .arg(
            Arg::new("last-name")
                .long("last-name")
                .help("Last name of the registrant")
                .required(true),
        )
        .arg(email_arg())
        .arg(
            Arg::new("referral-code")
                .long("referral-code")
                .help("Referral code, 4-12 alphanumeric characters with at least one letter")
                .required(true),
        )
        .arg(store_url_arg())
        .arg(redirect_url_arg())
}

fn verify_command() -> Command {
    Command::new("verify")
        .about("Verify the passcode for a pending registration")
        .arg(email_arg())
        .arg(
            Arg::new("code")
                .short('c')
                .long("code")
                .help("6-digit passcode; prompts interactively when omitted"),
        )
        .arg(store_url_arg())
        .arg(redirect_url_arg())
}

fn resend_command() -> Command {
    Command::new("resend")
        .about("Issue a new passcode for a pending registration")
        .arg(email_arg())
        .arg(store_url_arg())
}

fn server_command() -> Command {
    Command::new("server")
        .about("Serve the update-status reconciliation endpoint")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ENROLO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("enrolo")
        .about("Registration and email verification workflow")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ENROLO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(register_command())
        .subcommand(verify_command())
        .subcommand(resend_command())
        .subcommand(server_command())
}
