/// Control byte marking a slot that has never held a value since the last
/// rehash or clear.
///
/// Both sentinels have the sign bit set so a single `movemask` separates
/// occupied lanes from the rest. `EMPTY` is the only sentinel whose low seven
/// bits are all zero, which is what the empty scan compares against.
pub const EMPTY: u8 = 0x80;

/// Control byte marking a tombstone: a slot whose value was removed while its
/// group had no empty lane left.
pub const DELETED: u8 = 0xFE;

const TAG_MASK: u64 = 0x7F;

/// The 7-bit fragment of a hash stored in the control byte of an occupied
/// slot (the "H2" value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(u8);

impl Tag {
    /// Builds a tag from the low seven bits of `bits`.
    #[inline(always)]
    pub const fn new(bits: u8) -> Self {
        Tag(bits & TAG_MASK as u8)
    }

    /// The raw control byte for a slot occupied with this tag.
    #[inline(always)]
    pub const fn byte(self) -> u8 {
        self.0
    }
}

/// Decoded state of a single control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Never used since the last rehash or clear. Terminates probing.
    Empty,
    /// Tombstone. Probing continues past it and plain inserts never reuse it.
    Deleted,
    /// Holds a value whose hash carries this tag.
    Occupied(Tag),
}

impl Control {
    /// Decodes a raw control byte.
    ///
    /// Bytes with the high bit set that are neither [`EMPTY`] nor [`DELETED`]
    /// are never written by the table; they decode as `Deleted` since they do
    /// not terminate a probe.
    #[inline(always)]
    pub const fn from_byte(byte: u8) -> Self {
        if byte & 0x80 == 0 {
            Control::Occupied(Tag(byte))
        } else if byte == EMPTY {
            Control::Empty
        } else {
            Control::Deleted
        }
    }

    /// Encodes this state as a raw control byte.
    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        match self {
            Control::Empty => EMPTY,
            Control::Deleted => DELETED,
            Control::Occupied(tag) => tag.0,
        }
    }

    /// Returns `true` for [`Control::Occupied`].
    #[inline(always)]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Control::Occupied(_))
    }
}

/// Splits a 64-bit digest into the group selector (`H1`, every bit above the
/// low seven) and the in-group tag (`H2`, the low seven bits).
#[inline(always)]
pub fn split_hash(hash: u64) -> (u64, Tag) {
    (hash >> 7, Tag((hash & TAG_MASK) as u8))
}
