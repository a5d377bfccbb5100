//! GitHub webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery's HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const PREFIX: &str = "sha256=";

/// Checks an `X-Hub-Signature-256` value (`sha256=<hex>`) against the raw body.
///
/// Must run on the exact bytes received, before any parsing. Comparison is
/// constant time.
#[must_use]
pub fn verify_signature(body: &[u8], header: &str, secret: &str) -> bool {
    let Some(hex_signature) = header.strip_prefix(PREFIX) else {
        return false;
    };
    let Ok(signature) = hex::decode(hex_signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    computed.as_slice().ct_eq(&signature).into()
}

#[cfg(test)]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "It's a Secret to Everybody";

    #[test]
    fn accepts_matching_signature() {
        let body = b"Hello, World!";
        assert!(verify_signature(body, &sign(body, SECRET), SECRET));
    }

    #[test]
    fn matches_githubs_published_example() {
        assert!(verify_signature(
            b"Hello, World!",
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17",
            SECRET,
        ));
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let header = sign(b"{\"action\":\"closed\"}", SECRET);
        assert!(!verify_signature(b"{\"action\":\"opened\"}", &header, SECRET));
        assert!(!verify_signature(b"{\"action\":\"closed\"}", &header, "other"));
    }

    #[test]
    fn rejects_malformed_headers() {
        let body = b"payload";
        let bare_hex = sign(body, SECRET).trim_start_matches(PREFIX).to_string();
        assert!(!verify_signature(body, &bare_hex, SECRET));
        assert!(!verify_signature(body, "sha256=not-hex", SECRET));
        assert!(!verify_signature(body, "sha256=abcd", SECRET));
        assert!(!verify_signature(body, "", SECRET));
    }
}
