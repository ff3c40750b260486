//! Deterministic content fingerprints for datasets.

/// 64-bit FNV-1a hash, stable across runs and platforms.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u64);

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

impl Fingerprint {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(OFFSET_BASIS)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ u64::from(*b)).wrapping_mul(PRIME);
        }
    }

    pub fn finish(&self) -> u64 {
        self.0
    }

    /// 16-character lowercase hex string, suitable for logs and metadata.
    pub fn finish_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(Fingerprint::new().finish(), OFFSET_BASIS);
    }

    #[test]
    fn matches_reference_vector() {
        let mut fp = Fingerprint::new();
        fp.update(b"a");
        assert_eq!(fp.finish_hex(), "af63dc4c8601ec8c");
    }

    #[test]
    fn chunking_does_not_matter() {
        let mut whole = Fingerprint::new();
        whole.update(b"Disease,has_cough\nFlu,1\n");
        let mut parts = Fingerprint::new();
        parts.update(b"Disease,has_cough\n");
        parts.update(b"Flu,1\n");
        assert_eq!(whole.finish(), parts.finish());
    }
}
