//! Input validation for usernames and passwords.

use uuid::Uuid;

use crate::defaults::{MAX_USERNAME_LEN, MIN_PASSWORD_LEN, MIN_USERNAME_LEN};

/// Whether a username is acceptable: 3 to 20 characters from `[A-Za-z0-9_]`.
pub fn valid_username(username: &str) -> bool {
    (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.len())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether a password meets the minimum strength requirement.
pub fn valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}

/// Generate a trial username: `Trial` plus six uppercase hex characters.
pub fn trial_username() -> String {
    let tag: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("Trial{tag}")
}
