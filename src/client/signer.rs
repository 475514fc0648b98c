use crate::error::{LiblibError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

const DELIMITER: char = '&';

/// Access key id plus shared secret. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let access_key = access_key.into();
        let secret = secret.into();
        if access_key.is_empty() || secret.is_empty() {
            return Err(LiblibError::Validation(
                "Access key and secret are both required".into(),
            ));
        }
        Ok(Self { access_key, secret })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-call signing material. Never reuse one for a second request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
}

#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn sign(&self, path: &str) -> SignedRequest {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let nonce = Uuid::new_v4().to_string();
        self.sign_with(path, &timestamp, &nonce)
    }

    pub fn sign_with(&self, path: &str, timestamp: &str, nonce: &str) -> SignedRequest {
        let mac = self.mac_for(path, timestamp, nonce);
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        SignedRequest {
            signature,
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
        }
    }

    pub fn verify(&self, path: &str, signed: &SignedRequest) -> bool {
        let Ok(expected) = URL_SAFE_NO_PAD.decode(&signed.signature) else {
            return false;
        };
        self.mac_for(path, &signed.timestamp, &signed.nonce)
            .verify_slice(&expected)
            .is_ok()
    }

    fn mac_for(&self, path: &str, timestamp: &str, nonce: &str) -> HmacSha1 {
        let content = canonical_string(path, timestamp, nonce);
        let mut mac = HmacSha1::new_from_slice(self.credentials.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(content.as_bytes());
        mac
    }
}

fn canonical_string(path: &str, timestamp: &str, nonce: &str) -> String {
    let mut content = String::with_capacity(path.len() + timestamp.len() + nonce.len() + 2);
    content.push_str(path);
    content.push(DELIMITER);
    content.push_str(timestamp);
    content.push(DELIMITER);
    content.push_str(nonce);
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> Signer {
        Signer::new(Credentials::new("test-key", "test-secret").unwrap())
    }

    #[test]
    fn test_known_signature() {
        // HMAC-SHA1("test-secret", "/api/generate/webui/status&1700000000000&nonce")
        let signer = signer();
        let signed = signer.sign_with("/api/generate/webui/status", "1700000000000", "nonce");

        let mut mac = HmacSha1::new_from_slice(b"test-secret").unwrap();
        mac.update(b"/api/generate/webui/status&1700000000000&nonce");
        let expected = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        assert_eq!(signed.signature, expected);
        // 20-byte digest -> 27 unpadded base64 chars
        assert_eq!(signed.signature.len(), 27);
        assert!(!signed.signature.contains('='));
        assert!(!signed.signature.contains('+'));
        assert!(!signed.signature.contains('/'));
    }

    #[test]
    fn test_signature_round_trip() {
        let signer = signer();
        let signed = signer.sign("/api/generate/webui/text2img/ultra");

        let again = signer.sign_with(
            "/api/generate/webui/text2img/ultra",
            &signed.timestamp,
            &signed.nonce,
        );
        assert_eq!(again, signed);
        assert!(signer.verify("/api/generate/webui/text2img/ultra", &signed));
        assert!(!signer.verify("/api/generate/webui/img2img/ultra", &signed));
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let signer = signer();
        let first = signer.sign("/api/generate/webui/status");
        let second = signer.sign("/api/generate/webui/status");

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.signature, second.signature);
        assert!(first.timestamp.parse::<i64>().unwrap() > 1_600_000_000_000);
    }

    #[test]
    fn test_other_secret_does_not_verify() {
        let signed = signer().sign("/path");
        let other = Signer::new(Credentials::new("test-key", "other-secret").unwrap());
        assert!(!other.verify("/path", &signed));

        let tampered = SignedRequest {
            signature: "not base64!".into(),
            ..signed
        };
        assert!(!signer().verify("/path", &tampered));
    }

    #[test]
    fn test_credentials_validation_and_redaction() {
        assert!(Credentials::new("", "secret").unwrap_err().is_validation());
        assert!(Credentials::new("key", "").unwrap_err().is_validation());

        let creds = Credentials::new("key", "super-secret").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("key"));
        assert!(!debug.contains("super-secret"));
    }
}
