//! Single use confirmation codes, exchanged for bearer tokens.
//!
//! A code is bound to a snapshot of the account state taken when it was issued. The
//! snapshot contains a random nonce, which is replaced whenever a code is consumed or
//! the account changes, so the code stops verifying after either happens.

use std::time::{Duration, SystemTime};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use yamdb_types::Role;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_LEN: usize = 8;
const MAC_LEN: usize = 32;

/// Account state a confirmation code is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub nonce: String,
}

impl AccountSnapshot {
    fn feed(&self, mac: &mut HmacSha256, issued_at: u64) {
        let fields: [&[u8]; 4] = [
            self.username.as_bytes(),
            self.email.as_bytes(),
            self.role.as_str().as_bytes(),
            self.nonce.as_bytes(),
        ];
        mac.update(&self.user_id.to_be_bytes());
        for field in fields {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field);
        }
        mac.update(&issued_at.to_be_bytes());
    }
}

pub struct ConfirmationCodes {
    key: Vec<u8>,
    validity: Duration,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl ConfirmationCodes {
    pub fn new(key: impl AsRef<[u8]>, validity: Duration) -> Self {
        Self {
            key: key.as_ref().to_vec(),
            validity,
        }
    }

    fn mac(&self, snapshot: &AccountSnapshot, issued_at: u64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| Error::InvalidKeyLength)?;
        snapshot.feed(&mut mac, issued_at);
        Ok(mac)
    }

    pub fn issue(&self, snapshot: &AccountSnapshot) -> Result<String> {
        self.issue_at(snapshot, now_secs())
    }

    fn issue_at(&self, snapshot: &AccountSnapshot, issued_at: u64) -> Result<String> {
        let tag = self.mac(snapshot, issued_at)?.finalize().into_bytes();
        let mut raw = Vec::with_capacity(TIMESTAMP_LEN + MAC_LEN);
        raw.extend_from_slice(&issued_at.to_be_bytes());
        raw.extend_from_slice(&tag);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    pub fn verify(&self, snapshot: &AccountSnapshot, code: &str) -> Result<()> {
        self.verify_at(snapshot, code, now_secs())
    }

    fn verify_at(&self, snapshot: &AccountSnapshot, code: &str, now: u64) -> Result<()> {
        let raw = URL_SAFE_NO_PAD
            .decode(code.trim())
            .map_err(|_| Error::MalformedCode)?;
        if raw.len() != TIMESTAMP_LEN + MAC_LEN {
            return Err(Error::MalformedCode);
        }
        let (ts, tag) = raw.split_at(TIMESTAMP_LEN);
        let issued_at = u64::from_be_bytes(ts.try_into().map_err(|_| Error::MalformedCode)?);

        self.mac(snapshot, issued_at)?
            .verify_slice(tag)
            .map_err(|_| Error::StaleCode)?;

        if issued_at > now || now - issued_at > self.validity.as_secs() {
            debug!(
                "Confirmation code for user {} issued at {issued_at} is out of validity window",
                snapshot.user_id
            );
            return Err(Error::ExpiredCode);
        }
        Ok(())
    }
}
