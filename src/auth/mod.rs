//! Users, passwords, the encrypted auth cookie, and the routes and middleware
//! that log users in and out and guard the rest of the app.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{INVALID_CREDENTIALS_ERROR_MSG, LoginState, get_log_in_page, post_log_in};
pub use log_out::{LogOutState, get_log_out};
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub(crate) use token::Token;
pub use user::{
    User, UserID, authenticate, count_users, create_user, create_user_table, get_user_by_username,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
