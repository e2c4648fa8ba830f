use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-chatplane-signature";
pub const EVENT_HEADER: &str = "x-chatplane-event";

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &str, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}

/// `sha256=<hex>` HMAC of the raw request body, keyed by the webhook secret.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mac = keyed(secret, body)?;
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Receiver-side check, constant time.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    keyed(secret, body).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_with_same_secret() {
        let body = br#"{"event":"message.created"}"#;
        let sig = sign("whsec", body).unwrap();
        assert!(sig.starts_with("sha256="));
        assert!(verify("whsec", body, &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let sig = sign("whsec", b"original").unwrap();
        assert!(!verify("whsec", b"tampered", &sig));
        assert!(!verify("other", b"original", &sig));
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2
        let sig = sign("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn malformed_signature_fails() {
        assert!(!verify("whsec", b"x", "md5=abc"));
        assert!(!verify("whsec", b"x", "sha256=zz"));
    }
}
