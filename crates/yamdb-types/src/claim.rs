use std::{fmt::Display, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid role: {0}, expected one of user, moderator, admin")]
pub struct InvalidRole(String);

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self, Role::Moderator)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

/// Claims carried by the bearer access token.
///
/// The role is informational only, authorization always uses the role currently stored
/// for the user identified by `sub`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
    pub role: Role,
}

impl ApiClaim {
    pub fn new_expired(sub: impl Into<String>, role: Role) -> Self {
        ApiClaim {
            sub: sub.into(),
            exp: 0,
            role,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = unix_secs(until);
    }

    fn check_validity(&self) -> bool {
        self.exp > unix_secs(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        for role in Role::ALL {
            assert_eq!(role, role.as_str().parse().unwrap());
        }
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
        assert!(!role.is_moderator());
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn test_claim_validity() {
        let mut claim = ApiClaim::new_expired("42", Role::User);
        assert!(!claim.check_validity());
        claim.set_validity(SystemTime::now() + std::time::Duration::from_secs(60));
        assert!(claim.check_validity());
        assert_eq!(Some(42), claim.user_id());
    }
}
