use alloc::boxed::Box;
use alloc::collections::TryReserveError as AllocTryReserveError;
use alloc::vec::Vec;

use crate::control::Control;
use crate::control::DELETED;
use crate::control::EMPTY;
use crate::control::Tag;
use crate::matching::GROUP_WIDTH;

/// The control bytes of one group.
///
/// Aligned to 16 so the SSE2 matcher can use aligned loads.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct CtrlBytes {
    pub(crate) bytes: [u8; GROUP_WIDTH],
}

impl CtrlBytes {
    /// A fully empty control word.
    pub const fn empty() -> Self {
        CtrlBytes {
            bytes: [EMPTY; GROUP_WIDTH],
        }
    }

    /// Decoded state of `lane`.
    #[inline(always)]
    pub fn get(&self, lane: usize) -> Control {
        Control::from_byte(self.bytes[lane])
    }
}

impl core::fmt::Debug for CtrlBytes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        for &b in &self.bytes {
            match Control::from_byte(b) {
                Control::Empty => list.entry(&format_args!("..")),
                Control::Deleted => list.entry(&format_args!("xx")),
                Control::Occupied(tag) => list.entry(&format_args!("{:02x}", tag.byte())),
            };
        }
        list.finish()
    }
}

/// Sixteen control bytes and the slots they describe, indexed identically.
#[derive(Clone)]
pub(crate) struct Group<V> {
    pub(crate) ctrl: CtrlBytes,
    pub(crate) slots: [Option<V>; GROUP_WIDTH],
}

impl<V> Group<V> {
    pub(crate) fn new() -> Self {
        Group {
            ctrl: CtrlBytes::empty(),
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Fills `lane` and marks it occupied with `tag`.
    #[inline(always)]
    pub(crate) fn occupy(&mut self, lane: usize, tag: Tag, value: V) -> &mut V {
        debug_assert!(!self.ctrl.get(lane).is_occupied());
        self.ctrl.bytes[lane] = tag.byte();
        self.slots[lane].insert(value)
    }

    /// Empties `lane`, leaving either a hard hole or a tombstone, and hands
    /// back the value it held.
    #[inline(always)]
    pub(crate) fn vacate(&mut self, lane: usize, tombstone: bool) -> V {
        debug_assert!(self.ctrl.get(lane).is_occupied());
        self.ctrl.bytes[lane] = if tombstone { DELETED } else { EMPTY };
        match self.slots[lane].take() {
            Some(value) => value,
            None => unreachable!("occupied lane without a value"),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.ctrl = CtrlBytes::empty();
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

/// Allocates `count` fully empty groups, aborting on allocation failure.
pub(crate) fn alloc_groups<V>(count: usize) -> Box<[Group<V>]> {
    (0..count).map(|_| Group::new()).collect()
}

/// Allocates `count` fully empty groups, reporting allocation failure.
pub(crate) fn try_alloc_groups<V>(count: usize) -> Result<Box<[Group<V>]>, AllocTryReserveError> {
    let mut groups = Vec::new();
    groups.try_reserve_exact(count)?;
    groups.extend((0..count).map(|_| Group::new()));
    Ok(groups.into_boxed_slice())
}
