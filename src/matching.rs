use core::fmt::Debug;

use crate::control::DELETED;
use crate::control::EMPTY;
use crate::control::Tag;
use crate::group::CtrlBytes;

/// Number of lanes in a group. Matches the width of one SSE2 register.
pub const GROUP_WIDTH: usize = 16;

/// A set of lanes within one group, lowest lane in bit 0.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct BitMask(u16);

impl BitMask {
    /// Wraps raw lane bits.
    #[inline(always)]
    pub const fn new(bits: u16) -> Self {
        BitMask(bits)
    }

    /// The raw lane bits.
    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` if any lane is set.
    #[inline(always)]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    /// Number of set lanes.
    #[inline(always)]
    pub const fn count_lanes(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The lowest set lane, without clearing it.
    #[inline(always)]
    pub fn lowest(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Clears the lowest set lane and returns its index.
    ///
    /// Repeated calls enumerate every set lane exactly once, in ascending
    /// order.
    #[inline(always)]
    pub fn take_lowest(&mut self) -> Option<usize> {
        let lane = self.lowest()?;
        self.0 &= self.0 - 1;
        Some(lane)
    }
}

impl Iterator for BitMask {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        self.take_lowest()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.count_lanes();
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitMask {}

impl Debug for BitMask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BitMask({:016b})", self.0)
    }
}

/// Lane-parallel comparisons over one group's control bytes.
///
/// Implementations are stateless and must agree bit-for-bit with [`Scalar`].
pub trait GroupMatch {
    /// Lanes whose control byte is `Occupied(tag)`.
    fn match_tag(ctrl: &CtrlBytes, tag: Tag) -> BitMask;

    /// Lanes whose control byte is `Empty`.
    fn match_empty(ctrl: &CtrlBytes) -> BitMask;

    /// Lanes whose control byte is `Deleted`.
    fn match_deleted(ctrl: &CtrlBytes) -> BitMask;

    /// Lanes holding a value (high bit clear).
    fn match_full(ctrl: &CtrlBytes) -> BitMask;
}

/// Portable fallback. Each lane folds into the mask without branching.
pub struct Scalar;

impl Scalar {
    #[inline(always)]
    fn match_byte(ctrl: &CtrlBytes, byte: u8) -> BitMask {
        let mut bits: u16 = 0;
        for (i, &b) in ctrl.bytes.iter().enumerate() {
            bits |= ((b == byte) as u16) << i;
        }
        BitMask(bits)
    }
}

impl GroupMatch for Scalar {
    #[inline(always)]
    fn match_tag(ctrl: &CtrlBytes, tag: Tag) -> BitMask {
        Self::match_byte(ctrl, tag.byte())
    }

    #[inline(always)]
    fn match_empty(ctrl: &CtrlBytes) -> BitMask {
        Self::match_byte(ctrl, EMPTY)
    }

    #[inline(always)]
    fn match_deleted(ctrl: &CtrlBytes) -> BitMask {
        Self::match_byte(ctrl, DELETED)
    }

    #[inline(always)]
    fn match_full(ctrl: &CtrlBytes) -> BitMask {
        let mut bits: u16 = 0;
        for (i, &b) in ctrl.bytes.iter().enumerate() {
            bits |= (((b >> 7) ^ 1) as u16) << i;
        }
        BitMask(bits)
    }
}

/// SSE2 backend: one compare plus one `movemask` per query.
#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
pub struct Sse2;

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
impl Sse2 {
    #[inline(always)]
    fn match_byte(ctrl: &CtrlBytes, byte: u8) -> BitMask {
        use core::arch::x86_64::*;
        // SAFETY: `CtrlBytes` is `#[repr(C, align(16))]` with `bytes` at offset
        // 0, so the pointer is 16-byte aligned and valid for a 16-byte load.
        unsafe {
            let data = _mm_load_si128(ctrl.bytes.as_ptr() as *const __m128i);
            let cmp = _mm_cmpeq_epi8(data, _mm_set1_epi8(byte as i8));
            BitMask(_mm_movemask_epi8(cmp) as u16)
        }
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
impl GroupMatch for Sse2 {
    #[inline(always)]
    fn match_tag(ctrl: &CtrlBytes, tag: Tag) -> BitMask {
        Self::match_byte(ctrl, tag.byte())
    }

    #[inline(always)]
    fn match_empty(ctrl: &CtrlBytes) -> BitMask {
        Self::match_byte(ctrl, EMPTY)
    }

    #[inline(always)]
    fn match_deleted(ctrl: &CtrlBytes) -> BitMask {
        Self::match_byte(ctrl, DELETED)
    }

    #[inline(always)]
    fn match_full(ctrl: &CtrlBytes) -> BitMask {
        use core::arch::x86_64::*;
        // SAFETY: see `match_byte`; the load is aligned and in bounds.
        unsafe {
            let data = _mm_load_si128(ctrl.bytes.as_ptr() as *const __m128i);
            BitMask(!(_mm_movemask_epi8(data) as u16))
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_feature = "sse2", not(feature = "force-scalar")))] {
        /// The matcher used by the table on this target.
        pub type Backend = Sse2;
    } else {
        /// The matcher used by the table on this target.
        pub type Backend = Scalar;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn ctrl_from(bytes: [u8; GROUP_WIDTH]) -> CtrlBytes {
        CtrlBytes { bytes }
    }

    fn random_ctrl(rng: &mut SmallRng) -> CtrlBytes {
        let mut bytes = [EMPTY; GROUP_WIDTH];
        for b in bytes.iter_mut() {
            *b = match rng.random_range(0..4u8) {
                0 => EMPTY,
                1 => DELETED,
                // Small tag range so tag matches are frequent.
                _ => rng.random_range(0..4u8),
            };
        }
        ctrl_from(bytes)
    }

    #[test]
    fn take_lowest_enumerates_each_lane_once() {
        let mut mask = BitMask::new(0b1000_0000_0100_1001);
        assert_eq!(mask.take_lowest(), Some(0));
        assert_eq!(mask.take_lowest(), Some(3));
        assert_eq!(mask.take_lowest(), Some(6));
        assert_eq!(mask.take_lowest(), Some(15));
        assert_eq!(mask.take_lowest(), None);
        assert!(!mask.any());

        let lanes: Vec<usize> = BitMask::new(0xFFFF).collect();
        assert_eq!(lanes, (0..GROUP_WIDTH).collect::<Vec<_>>());
    }

    #[test]
    fn scalar_matches_known_layout() {
        let mut bytes = [EMPTY; GROUP_WIDTH];
        bytes[1] = 0x05;
        bytes[4] = DELETED;
        bytes[7] = 0x05;
        bytes[9] = 0x7F;
        let ctrl = ctrl_from(bytes);

        assert_eq!(
            Scalar::match_tag(&ctrl, Tag::new(0x05)).bits(),
            (1 << 1) | (1 << 7)
        );
        assert_eq!(Scalar::match_tag(&ctrl, Tag::new(0x7F)).bits(), 1 << 9);
        assert_eq!(Scalar::match_deleted(&ctrl).bits(), 1 << 4);
        assert_eq!(
            Scalar::match_full(&ctrl).bits(),
            (1 << 1) | (1 << 7) | (1 << 9)
        );
        assert_eq!(
            Scalar::match_empty(&ctrl).bits(),
            !((1 << 1) | (1 << 4) | (1 << 7) | (1 << 9))
        );
    }

    #[test]
    fn empty_tag_zero_does_not_match_sentinels() {
        // Tag 0 shares its low seven bits with EMPTY.
        let ctrl = ctrl_from([EMPTY; GROUP_WIDTH]);
        assert!(!Scalar::match_tag(&ctrl, Tag::new(0)).any());
        assert!(!Backend::match_tag(&ctrl, Tag::new(0)).any());
        assert_eq!(Backend::match_empty(&ctrl).bits(), 0xFFFF);
        assert!(!Backend::match_full(&ctrl).any());
    }

    #[test]
    fn backend_agrees_with_scalar() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        for _ in 0..10_000 {
            let ctrl = random_ctrl(&mut rng);
            let tag = Tag::new(rng.random_range(0..4u8));
            assert_eq!(
                Backend::match_tag(&ctrl, tag),
                Scalar::match_tag(&ctrl, tag)
            );
            assert_eq!(Backend::match_empty(&ctrl), Scalar::match_empty(&ctrl));
            assert_eq!(Backend::match_deleted(&ctrl), Scalar::match_deleted(&ctrl));
            assert_eq!(Backend::match_full(&ctrl), Scalar::match_full(&ctrl));
        }
    }

    #[test]
    fn masks_partition_the_group() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let ctrl = random_ctrl(&mut rng);
            let empty = Backend::match_empty(&ctrl).bits();
            let deleted = Backend::match_deleted(&ctrl).bits();
            let full = Backend::match_full(&ctrl).bits();
            assert_eq!(empty & deleted, 0);
            assert_eq!(empty & full, 0);
            assert_eq!(deleted & full, 0);
            assert_eq!(empty | deleted | full, 0xFFFF);
        }
    }
}
