use data_encoding::BASE64;

/// Blake3 digest of a written payload, used as the dedup-table key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_LEN]);

pub const DIGEST_LEN: usize = 32;

impl ContentDigest {
    /// Digest the flattened byte representation of a payload.
    pub fn of(payload: &[u8]) -> Self {
        Self(*blake3::hash(payload).as_bytes())
    }

    /// Digest a payload together with its length prefix, for blocks whose
    /// consumer needs a self-describing size.
    pub fn of_prefixed(prefix: &[u8], payload: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(prefix);
        hasher.update(payload);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<&[u8; DIGEST_LEN]> for ContentDigest {
    fn from(value: &[u8; DIGEST_LEN]) -> Self {
        Self(*value)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}
