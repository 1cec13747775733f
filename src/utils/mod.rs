pub mod case;
pub mod launch_params;
pub mod telegram_auth;
