//! Request authentication for private endpoints.
//!
//! `API-Sign = base64(HMAC-SHA512(secret, path ++ SHA256(nonce ++ body)))`

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::error::VenueError;

type HmacSha512 = Hmac<Sha512>;

/// Holds the decoded API secret. The secret never leaves this type.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(api_secret_b64: &str) -> Result<Self, VenueError> {
        if api_secret_b64.trim().is_empty() {
            return Err(VenueError::MissingApiSecret);
        }
        let secret = BASE64.decode(api_secret_b64.trim())?;
        Ok(Self { secret })
    }

    pub fn sign(&self, path: &str, nonce: &str, encoded_body: &str) -> String {
        sign(&self.secret, path, nonce, encoded_body)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Signer(<redacted>)")
    }
}

pub fn sign(secret: &[u8], path: &str, nonce: &str, encoded_body: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(nonce.as_bytes());
    sha.update(encoded_body.as_bytes());
    let digest = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(path.as_bytes());
    mac.update(&digest);
    BASE64.encode(mac.finalize().into_bytes())
}
