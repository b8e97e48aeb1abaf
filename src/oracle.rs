use core::hash::BuildHasher;
use core::hash::BuildHasherDefault;
use core::hash::Hasher;

/// A [`BuildHasher`] that can produce an independent replacement of itself.
pub trait HashOracle: BuildHasher {
    /// Returns a new builder whose digests are independent of `self`'s.
    ///
    /// Builders without per-instance state (such as [`BuildHasherDefault`])
    /// return an equivalent builder.
    fn reseed(&self) -> Self
    where
        Self: Sized;
}

impl<H> HashOracle for BuildHasherDefault<H>
where
    H: Default + Hasher,
{
    fn reseed(&self) -> Self {
        BuildHasherDefault::default()
    }
}

#[cfg(feature = "std")]
impl HashOracle for std::hash::RandomState {
    fn reseed(&self) -> Self {
        // Each `new` call on a thread yields different keys.
        std::hash::RandomState::new()
    }
}

#[cfg(feature = "foldhash")]
impl HashOracle for foldhash::fast::RandomState {
    fn reseed(&self) -> Self {
        foldhash::fast::RandomState::default()
    }
}

#[cfg(feature = "foldhash")]
impl HashOracle for foldhash::quality::RandomState {
    fn reseed(&self) -> Self {
        foldhash::quality::RandomState::default()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hash builder used when none is named.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hash builder used when none is named.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Without `foldhash` or `std` there is no randomized builder to fall
        /// back on; callers are expected to supply their own oracle.
        pub type DefaultHashBuilder = BuildHasherDefault<NoDefaultHasher>;

        /// Placeholder hasher that makes [`DefaultHashBuilder`] nameable in
        /// `no_std` builds without `foldhash`. It mixes input with a fixed
        /// multiplier and offers no collision resistance.
        #[derive(Default)]
        pub struct NoDefaultHasher(u64);

        impl Hasher for NoDefaultHasher {
            fn finish(&self) -> u64 {
                self.0
            }

            fn write(&mut self, bytes: &[u8]) {
                for &b in bytes {
                    self.0 = (self.0 ^ b as u64).wrapping_mul(0x0100_0000_01b3).rotate_left(5);
                }
            }
        }
    }
}
