use serde::{Deserialize, Serialize};

use crate::storage::{self, KeyValueStore, StorageError, SSO_KEY};

const REQUEST_KEY_LENGTH: usize = 32;

/// Locally kept secret. Its SHA-256 hash is sent to the authorization server as the nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey(String);

impl RequestKey {
    /// Generate a new cryptographically random request key of 32 characters, drawn from the
    /// unreserved URI characters.
    pub fn generate() -> Self {
        use rand::Rng;

        const CHARSET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
        let mut rng = rand::rng();

        let key = (0..REQUEST_KEY_LENGTH)
            .map(|_i| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect::<String>();

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_nonce(&self) -> Nonce {
        Nonce(sha256_hex(&self.0))
    }
}

/// Hex encoded SHA-256 hash of a [`RequestKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce(String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn sha256_hex(value: &str) -> String {
    use sha2::{Digest, Sha256};

    format!("{:x}", Sha256::digest(value.as_bytes()))
}

/// Persisted under [`SSO_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SsoRecord {
    pub(crate) request_key: String,
}

/// Single-slot ledger of the request key belonging to the login attempt in flight.
///
/// Creating a nonce overwrites any previously stored request key, so only tokens issued for the
/// latest login attempt are accepted. Nothing is held in memory; every check re-reads the store.
pub struct NonceLedger<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> NonceLedger<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn create_request_key(&self) -> RequestKey {
        RequestKey::generate()
    }

    /// Generate and persist a new request key, returning its hash.
    pub fn create_nonce(&self) -> Result<Nonce, StorageError> {
        let request_key = self.create_request_key();
        storage::write_value(
            self.store,
            SSO_KEY,
            &SsoRecord {
                request_key: request_key.as_str().to_owned(),
            },
        )?;
        Ok(request_key.to_nonce())
    }

    /// Whether `nonce` fails to match the hash of the stored request key.
    ///
    /// A missing nonce, a missing or unreadable record and a hash mismatch all count as replay.
    pub fn is_a_replay_attack(&self, nonce: Option<&str>) -> Result<bool, StorageError> {
        let Some(nonce) = nonce else {
            return Ok(true);
        };
        let record = storage::read_value(self.store, SSO_KEY)?
            .and_then(|value| serde_json::from_value::<SsoRecord>(value).ok())
            .filter(|record| !record.request_key.is_empty());

        match record {
            Some(record) => Ok(sha256_hex(&record.request_key) != nonce),
            None => {
                tracing::debug!("No request key stored. Treating nonce as replayed.");
                Ok(true)
            }
        }
    }

    pub fn clear_nonce(&self) -> Result<(), StorageError> {
        storage::remove_value(self.store, SSO_KEY)
    }
}
