pub mod health;
pub use self::health::health;

pub mod update_status;
pub use self::update_status::update_status;
