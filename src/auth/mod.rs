//! User accounts and session authentication.
//!
//! Users register and log in with their CPF. Sessions are kept in private
//! (signed and encrypted) cookies that expire after thirty minutes of
//! inactivity.

mod cookie;
mod cpf;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register;
mod user;

pub(crate) use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use cpf::Cpf;
pub use log_in::{LoginState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{RegistrationState, get_register_page, register_user};
pub use user::{User, UserID, create_user_table, get_user_by_id};
pub(crate) use user::create_user;
