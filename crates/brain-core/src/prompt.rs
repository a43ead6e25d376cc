//! Fingerprints for prompts and audit payloads.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint (lowercase hex) for a string.
///
/// Used to log which system prompt is active and to hash query/response
/// text for audit records without storing the text itself.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::fingerprint;

    #[test]
    fn test_fingerprint_stable() {
        let first = fingerprint("test prompt");
        let second = fingerprint("test prompt");
        let different = fingerprint("another prompt");

        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
