use core::hash::BuildHasher;
use core::hash::BuildHasherDefault;
use core::hash::Hasher;

use rand::TryRngCore;
use rand::rngs::OsRng;
use siphasher::sip::SipHasher;

use crate::oracle::HashOracle;

/// Keyed SipHash builder whose reseed draws fresh keys from the OS.
#[derive(Clone, Debug)]
pub(crate) struct SipHashBuilder {
    k1: u64,
    k2: u64,
}

impl SipHashBuilder {
    pub(crate) fn with_keys(k1: u64, k2: u64) -> Self {
        Self { k1, k2 }
    }
}

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(self.k1, self.k2)
    }
}

impl Default for SipHashBuilder {
    fn default() -> Self {
        Self {
            k1: OsRng.try_next_u64().unwrap_or(0),
            k2: OsRng.try_next_u64().unwrap_or(0),
        }
    }
}

impl HashOracle for SipHashBuilder {
    fn reseed(&self) -> Self {
        Self::default()
    }
}

/// Hashes an integer key to itself, so tests can place keys in chosen groups
/// with chosen tags.
#[derive(Default)]
pub(crate) struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = n as u64;
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

pub(crate) type IdentityBuilder = BuildHasherDefault<IdentityHasher>;
