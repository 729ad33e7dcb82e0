//! Implements registration, log in and the token-based authentication that
//! protects the rest of the API.

mod log_in;
mod register;
mod token;

pub use log_in::{LogInForm, UserSummary, log_in_endpoint};
pub use register::{RegisterForm, register_endpoint};
pub use token::{Claims, TokenType, encode_token};
