//! Webhook Authentication - HMAC-SHA256 Body Signatures
//!
//! Verifies the `X-Signature` header on inbound webhooks: the sender
//! computes HMAC-SHA256 over the raw request body with the shared
//! secret and base64-encodes the digest. An empty configured secret
//! disables verification entirely.

use base64::Engine;

/// Shared-secret verifier for webhook payloads.
pub struct WebhookAuth {
    secret: String,
}

impl WebhookAuth {
    /// Build a verifier from the shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compute the expected signature for a body.
    pub fn sign(&self, body: &[u8]) -> String {
        let mac = hmac_sha256::HMAC::mac(body, self.secret.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(mac)
    }

    /// Verify a presented signature against the body.
    ///
    /// The comparison is constant time in the signature length.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> bool {
        let Some(signature) = signature else {
            return false;
        };
        let expected = self.sign(body);
        if expected.len() != signature.len() {
            return false;
        }
        expected
            .bytes()
            .zip(signature.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signature_verifies() {
        let auth = WebhookAuth::new("topsecret");
        let body = br#"{"action":"BUY","symbol":"BTCUSDT","price":100}"#;
        let signature = auth.sign(body);
        assert!(auth.verify(body, Some(&signature)));
    }

    #[test]
    fn test_tampered_body_fails() {
        let auth = WebhookAuth::new("topsecret");
        let signature = auth.sign(b"original");
        assert!(!auth.verify(b"tampered", Some(&signature)));
    }

    #[test]
    fn test_missing_signature_fails() {
        let auth = WebhookAuth::new("topsecret");
        assert!(!auth.verify(b"anything", None));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = WebhookAuth::new("secret-a").sign(b"body");
        assert!(!WebhookAuth::new("secret-b").verify(b"body", Some(&signature)));
    }
}
