//! Request fingerprinting for log correlation

use sha2::{Digest, Sha256};

use crate::interaction::{Request, SerializedRequest};
use crate::matchers::UriParts;

/// Compute SHA-256 fingerprint of a request
///
/// The fingerprint includes:
/// 1. Method (uppercase normalized)
/// 2. Scheme, host and path (normalized)
/// 3. Query parameters (sorted)
/// 4. Body
#[must_use]
pub fn fingerprint_request(request: &Request) -> [u8; 32] {
    fingerprint_parts(&request.method, &request.uri, &request.body)
}

/// Fingerprint of a recorded request; equal to the live one it was captured from
#[must_use]
pub fn fingerprint_recorded(recorded: &SerializedRequest) -> [u8; 32] {
    let body = recorded.body.to_bytes().unwrap_or_default();
    fingerprint_parts(&recorded.method, &recorded.uri, &body)
}

/// First 8 bytes of a fingerprint, hex encoded
#[must_use]
pub fn short_hex(fingerprint: &[u8; 32]) -> String {
    hex::encode(&fingerprint[..8])
}

fn fingerprint_parts(method: &str, uri: &str, body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();

    // 1. Method (uppercase normalized)
    let method = method.to_uppercase();
    update_field(&mut hasher, method.as_bytes());

    // 2. Scheme, host, path
    let parts = UriParts::parse(uri);
    update_field(&mut hasher, parts.scheme.as_bytes());
    update_field(&mut hasher, parts.host.as_bytes());
    update_field(&mut hasher, parts.path.as_bytes());

    // 3. Query parameters (already sorted)
    for (key, value) in &parts.query {
        update_field(&mut hasher, key.as_bytes());
        update_field(&mut hasher, value.as_bytes());
    }

    // 4. Body
    update_field(&mut hasher, body);

    hasher.finalize().into()
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_request() -> Request {
        Request::new("GET", "https://api.example.com/api/test")
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let request = test_request();
        assert_eq!(
            fingerprint_request(&request),
            fingerprint_request(&request),
            "Fingerprint must be deterministic"
        );
    }

    #[test]
    fn test_fingerprint_different_methods() {
        let mut req2 = test_request();
        req2.method = "POST".to_string();

        assert_ne!(
            fingerprint_request(&test_request()),
            fingerprint_request(&req2),
            "Different methods should produce different hashes"
        );
    }

    #[test]
    fn test_fingerprint_different_bodies() {
        let req1 = test_request().with_body("a");
        let req2 = test_request().with_body("b");

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_query_order_independence() {
        let req1 = Request::new("GET", "https://h/p?b=2&a=1");
        let req2 = Request::new("GET", "https://h/p?a=1&b=2");

        assert_eq!(
            fingerprint_request(&req1),
            fingerprint_request(&req2),
            "Query parameter order should not affect fingerprint"
        );
    }

    #[test]
    fn test_recorded_matches_live() {
        let request = test_request().with_body(vec![0xff, 0x01]);
        let recorded = SerializedRequest::from_request(&request);

        assert_eq!(fingerprint_request(&request), fingerprint_recorded(&recorded));
    }

    #[test]
    fn test_short_hex() {
        let hex = short_hex(&fingerprint_request(&test_request()));
        assert_eq!(hex.len(), 16);
    }
}
