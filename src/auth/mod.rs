//! User accounts, password hashing, the session cookie and the pages for
//! logging in, registering and managing a profile.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{delete_account_endpoint, get_profile_page, update_profile_endpoint};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub use register::{get_register_page, register_user};
pub use user::{
    NewUser, User, UserID, UserPatch, Username, create_user, create_user_table, delete_user,
    get_user_by_id, get_user_by_username, update_password, update_user,
};
