use sha2::Digest as _;

/// Lower-case hex SHA-256 of `bytes`.
///
/// Used for content and file fingerprints of variants; not a security boundary.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/digest.rs"]
mod tests;
