use std::time::{Duration, SystemTime};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use yamdb_types::claim::{ApiClaim, Role, TimeLimited};

use crate::error::Result;

/// Issues and validates access tokens.
///
/// Tokens are HS256 JWTs carrying user id as `sub` and an expiry. Nothing about
/// issued tokens is stored, so a token stays usable until it expires or its user
/// is deleted.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        TokenManager {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validity,
            validation,
        }
    }

    fn sign(&self, claim: &ApiClaim) -> Result<String> {
        let token = encode(&Header::new(Algorithm::HS256), claim, &self.encoding)?;
        Ok(token)
    }

    /// Access token for given user, valid for configured period from now
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String> {
        let mut claim = ApiClaim::new_expired(user_id.to_string(), role);
        claim.set_validity(SystemTime::now() + self.validity);
        self.sign(&claim)
    }

    pub fn validate(&self, token: &str) -> Result<ApiClaim> {
        let data = decode::<ApiClaim>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}
