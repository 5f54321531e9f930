use url::Url;

pub mod register;
pub mod resend;
pub mod server;
pub mod verify;

/// Action to take once the CLI has been parsed.
#[derive(Debug)]
pub enum Action {
    Register {
        first_name: String,
        last_name: String,
        email: String,
        referral_code: String,
        store_url: Url,
        redirect_url: Url,
    },
    Verify {
        email: String,
        code: Option<String>,
        store_url: Url,
        redirect_url: Url,
    },
    Resend {
        email: String,
        store_url: Url,
    },
    Server {
        port: u16,
    },
}
