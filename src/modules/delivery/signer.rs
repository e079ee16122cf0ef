use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use md5::{Digest, Md5};

/// Signature over (expiry, path, secret). Deterministic on purpose: the same
/// rewritten manifest is served from cache to many clients, so identical
/// inputs must produce identical signatures.
pub fn sign(path: &str, expiry: i64, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(expiry.to_string().as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub fn verify(path: &str, expiry: i64, signature: &str, secret: &str) -> bool {
    let expected = sign(path, expiry, secret);
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

/// Compares without short-circuiting so the runtime does not depend on where
/// the first mismatching byte sits.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn sign_is_deterministic() {
        let a = sign("/media/abc/360p/seg_000.ts", 1700000000, SECRET);
        let b = sign("/media/abc/360p/seg_000.ts", 1700000000, SECRET);
        assert_eq!(a, b);
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let path = "/media/abc123/720p/seg_004.ts";
        let expiry = 1700001234;
        let sig = sign(path, expiry, SECRET);
        assert!(verify(path, expiry, &sig, SECRET));
    }

    #[test]
    fn verify_rejects_altered_path() {
        let sig = sign("/media/abc/360p/seg_000.ts", 1700000000, SECRET);
        assert!(!verify("/media/abc/360p/seg_001.ts", 1700000000, &sig, SECRET));
    }

    #[test]
    fn verify_rejects_altered_expiry() {
        let path = "/media/abc/360p/seg_000.ts";
        let sig = sign(path, 1700000000, SECRET);
        assert!(!verify(path, 1700000001, &sig, SECRET));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let path = "/media/abc/360p/seg_000.ts";
        let sig = sign(path, 1700000000, SECRET);
        assert!(!verify(path, 1700000000, &sig, "other-secret"));
    }

    #[test]
    fn verify_rejects_truncated_signature() {
        let path = "/media/abc/360p/seg_000.ts";
        let sig = sign(path, 1700000000, SECRET);
        assert!(!verify(path, 1700000000, &sig[..sig.len() - 1], SECRET));
    }

    #[test]
    fn signature_is_url_safe() {
        let sig = sign("/media/abc/1080p/seg_123.ts", 1700009999, SECRET);
        assert!(!sig.contains('+') && !sig.contains('/') && !sig.contains('='));
    }
}
