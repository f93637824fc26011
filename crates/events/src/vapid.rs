//! VAPID signing credentials (RFC 8292) loaded from a PEM key file.
//!
//! Two entry points share the same parser:
//!
//! - [`load_vapid_key`] is the boot-time check. It returns an error so the
//!   binary can refuse to start without a key.
//! - [`VapidKeySource::credentials`] is used on the delivery path. It never
//!   fails; a missing or broken key yields `None` and the caller skips push.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use p256::ecdsa::SigningKey;
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for key loading.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Failed to read key file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No EC private key found in {0}")]
    NotFound(PathBuf),
}

// ---------------------------------------------------------------------------
// VapidCredentials
// ---------------------------------------------------------------------------

/// Key material used to authenticate outgoing push messages.
///
/// The private key is the raw 32-byte P-256 scalar and the public key the
/// 65-byte uncompressed SEC1 point, both base64url without padding. That is
/// the form `web_push::VapidSignatureBuilder::from_base64` expects.
#[derive(Clone, PartialEq, Eq)]
pub struct VapidCredentials {
    subscriber: String,
    private_key_b64: String,
    public_key_b64: String,
}

impl std::fmt::Debug for VapidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidCredentials")
            .field("subscriber", &self.subscriber)
            .field("public_key_b64", &self.public_key_b64)
            .finish_non_exhaustive()
    }
}

impl VapidCredentials {
    /// Derive credentials from a P-256 secret key.
    pub fn from_secret_key(secret: &SecretKey, subscriber: impl Into<String>) -> Self {
        let signing_key = SigningKey::from(secret);
        // SEC1 uncompressed public key (65 bytes: 0x04 || x || y)
        let public_bytes = signing_key.verifying_key().to_encoded_point(false);

        Self {
            subscriber: subscriber.into(),
            private_key_b64: BASE64URL.encode(signing_key.to_bytes().as_slice()),
            public_key_b64: BASE64URL.encode(public_bytes.as_bytes()),
        }
    }

    /// Contact sent in the VAPID `sub` claim.
    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    /// Base64url-encoded raw private key scalar.
    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }

    /// Base64url-encoded uncompressed public key.
    ///
    /// Browsers use this as the `applicationServerKey` when subscribing.
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }
}

// ---------------------------------------------------------------------------
// Key file parsing
// ---------------------------------------------------------------------------

/// Read `path` and return the first PEM block that parses as an EC private key.
pub fn load_vapid_key(path: impl AsRef<Path>) -> Result<SecretKey, KeyError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_vapid_key(&text).ok_or_else(|| KeyError::NotFound(path.to_path_buf()))
}

/// First EC private key among the PEM blocks of `text`.
///
/// SEC1 (`EC PRIVATE KEY`) is tried first, then PKCS#8 (`PRIVATE KEY`).
/// Other blocks such as `EC PARAMETERS` are skipped.
pub fn parse_vapid_key(text: &str) -> Option<SecretKey> {
    pem_blocks(text).find_map(|block| {
        SecretKey::from_sec1_pem(block)
            .ok()
            .or_else(|| SecretKey::from_pkcs8_pem(block).ok())
    })
}

/// Split `text` into its `-----BEGIN ...-----` / `-----END ...-----` blocks.
fn pem_blocks(text: &str) -> impl Iterator<Item = &str> + '_ {
    const BEGIN: &str = "-----BEGIN ";
    const END: &str = "-----END ";
    const DASHES: &str = "-----";

    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find(BEGIN)?;
        let block = &rest[start..];
        let end = block.find(END)?;
        let label_len = block[end + END.len()..].find(DASHES)?;
        let block_len = end + END.len() + label_len + DASHES.len();
        rest = &block[block_len..];
        Some(&block[..block_len])
    })
}

// ---------------------------------------------------------------------------
// VapidKeySource
// ---------------------------------------------------------------------------

/// Lazily derived, process-lifetime VAPID credentials.
///
/// Derivation happens under a mutex, so concurrent first callers wait for a
/// single read of the key file. A successful result is cached; failures are
/// not, so a key installed later is picked up by the next call.
pub struct VapidKeySource {
    path: PathBuf,
    subscriber: String,
    cached: Mutex<Option<Arc<VapidCredentials>>>,
}

impl VapidKeySource {
    pub fn new(path: impl Into<PathBuf>, subscriber: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subscriber: subscriber.into(),
            cached: Mutex::new(None),
        }
    }

    /// A source that already holds credentials, for example from the
    /// boot-time [`load_vapid_key`] call.
    pub fn preloaded(path: impl Into<PathBuf>, credentials: VapidCredentials) -> Self {
        Self {
            path: path.into(),
            subscriber: credentials.subscriber.clone(),
            cached: Mutex::new(Some(Arc::new(credentials))),
        }
    }

    /// Current credentials, or `None` if the key is unavailable.
    pub async fn credentials(&self) -> Option<Arc<VapidCredentials>> {
        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref() {
            return Some(Arc::clone(credentials));
        }

        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_vapid_key(path)).await;
        match loaded {
            Ok(Ok(secret)) => {
                let credentials = Arc::new(VapidCredentials::from_secret_key(
                    &secret,
                    self.subscriber.clone(),
                ));
                tracing::info!(path = %self.path.display(), "VAPID key loaded");
                *cached = Some(Arc::clone(&credentials));
                Some(credentials)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    "VAPID key unavailable, web push disabled for this call"
                );
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "VAPID key loading task failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
