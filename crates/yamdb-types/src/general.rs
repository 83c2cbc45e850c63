use std::str::FromStr;

use garde::Validate;
use serde::{Deserialize, Serialize};

/// Alias used by the self-service profile path, so it cannot be anybody's username.
pub const RESERVED_USERNAME: &str = "me";

#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[garde(transparent)]
pub struct ValidEmail(#[garde(email, length(max = 254))] String);

#[cfg(feature = "e2e-tests")]
impl ValidEmail {
    pub fn cheat(email: String) -> Self {
        ValidEmail(email)
    }
}

impl FromStr for ValidEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = ValidEmail(s.to_string());
        email.validate()?;
        Ok(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ValidEmail> for String {
    fn from(value: ValidEmail) -> Self {
        value.0
    }
}

pub fn is_reserved_username(username: &str) -> bool {
    username.eq_ignore_ascii_case(RESERVED_USERNAME)
}

/// garde rule rejecting the reserved `me` username
pub fn not_reserved_username(username: &str, _ctx: &()) -> garde::Result {
    if is_reserved_username(username) {
        Err(garde::Error::new(format!(
            "Username '{username}' is reserved"
        )))
    } else {
        Ok(())
    }
}

pub fn optional_not_reserved_username(username: &Option<String>, ctx: &()) -> garde::Result {
    match username {
        Some(username) => not_reserved_username(username, ctx),
        None => Ok(()),
    }
}
