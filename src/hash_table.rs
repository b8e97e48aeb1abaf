use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::sync::atomic::AtomicUsize;
use core::sync::atomic::Ordering;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::control::Tag;
use crate::control::split_hash;
use crate::error::TryReserveError;
use crate::group::Group;
use crate::group::alloc_groups;
use crate::group::try_alloc_groups;
use crate::matching::BitMask;
use crate::matching::Backend;
use crate::matching::GROUP_WIDTH;
use crate::matching::GroupMatch;

cfg_if::cfg_if! {
    if #[cfg(feature = "density-ninety-three-point-seven-five")] {
        /// Average number of occupied or tombstoned slots per group allowed
        /// before an insert forces a rehash.
        pub const MAX_AVG_GROUP_LOAD: usize = 15;
    } else if #[cfg(feature = "density-eighty-seven-point-five")] {
        /// Average number of occupied or tombstoned slots per group allowed
        /// before an insert forces a rehash.
        pub const MAX_AVG_GROUP_LOAD: usize = 14;
    } else if #[cfg(feature = "density-seventy-five")] {
        /// Average number of occupied or tombstoned slots per group allowed
        /// before an insert forces a rehash.
        pub const MAX_AVG_GROUP_LOAD: usize = 12;
    } else {
        /// Average number of occupied or tombstoned slots per group allowed
        /// before an insert forces a rehash.
        pub const MAX_AVG_GROUP_LOAD: usize = 14;
    }
}

const _: () = assert!(MAX_AVG_GROUP_LOAD < GROUP_WIDTH);

/// Odd increment for the per-table iteration seed counter.
const ITER_SEED_STEP: usize = 0x9E37_79B9;

/// Minimum number of groups needed to hold `capacity` elements under the load
/// limit. Never zero.
#[inline]
fn num_groups(capacity: usize) -> usize {
    capacity.div_ceil(MAX_AVG_GROUP_LOAD).max(1)
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

/// Location of a slot: group index and lane within the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    group: usize,
    lane: usize,
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live elements
    pub len: usize,
    /// Slots consumed since the last rehash or clear (live plus tombstones)
    pub resident: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Resident count at which the next insert forces a rehash
    pub element_limit: usize,
    /// Number of groups in the group array
    pub group_count: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Number of slots that still terminate probes
    pub empty_slots: usize,
    /// Number of groups without a single empty slot
    pub full_groups: usize,
    /// Load factor (len / total_slots)
    pub load_factor: f64,
    /// Slot utilization (resident / total_slots)
    pub slot_utilization: f64,
    /// Bytes used by the group array
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Swiss Table Debug Statistics ===");
        println!(
            "Population: {} live, {} resident, {} tombstones (limit {})",
            self.len, self.resident, self.tombstones, self.element_limit
        );
        println!(
            "Groups: {} ({} without an empty slot)",
            self.group_count, self.full_groups
        );
        println!(
            "Slots: {}/{} used ({:.2}% utilization, {:.2}% load factor)",
            self.resident,
            self.total_slots,
            self.slot_utilization * 100.0,
            self.load_factor * 100.0
        );
        println!("Empty: {} slots", self.empty_slots);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// An open-addressing Swiss table.
///
/// `HashTable<V>` stores values in groups of sixteen slots, each described by
/// a control byte that is either empty, a tombstone, or a 7-bit fragment of the
/// value's hash. Like the set built on top of it, the table does not hash
/// anything itself: every operation takes the value's 64-bit hash and an
/// equality predicate, and operations that may move values take a `hasher`
/// closure that recomputes a stored value's hash.
///
/// ## Probing
///
/// A hash selects a home group (`(hash >> 7) % group_count`) and a tag
/// (`hash & 0x7f`). Lookups scan the home group for lanes carrying the tag,
/// then stop at the first group that still has an empty slot, moving to the
/// next group (wrapping) otherwise. Inserts always fill the first empty slot on
/// that path, so reaching an empty slot proves absence.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hasher;
/// #
/// # use siphasher::sip::SipHasher;
/// # use swiss_set::hash_table::Entry;
/// # use swiss_set::hash_table::HashTable;
/// #
/// # fn hash_u64(n: u64) -> u64 {
/// #     let mut hasher = SipHasher::new_with_keys(7, 11);
/// #     hasher.write_u64(n);
/// #     hasher.finish()
/// # }
/// #
/// let mut table = HashTable::with_capacity(100);
///
/// match table.entry(hash_u64(123), |&v: &u64| v == 123, |&v| hash_u64(v)) {
///     Entry::Vacant(entry) => {
///         entry.insert(123);
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash_u64(123), |&v| v == 123), Some(&123));
/// ```
pub struct HashTable<V> {
    groups: Box<[Group<V>]>,

    resident: usize,
    dead: usize,
    element_limit: usize,

    iter_seed: AtomicUsize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field(
                "ctrl",
                &self.groups.iter().map(|g| &g.ctrl).collect::<Vec<_>>(),
            )
            .field("resident", &self.resident)
            .field("dead", &self.dead)
            .field("element_limit", &self.element_limit)
            .finish()
    }
}

impl<V> Clone for HashTable<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
            resident: self.resident,
            dead: self.dead,
            element_limit: self.element_limit,
            iter_seed: AtomicUsize::new(
                self.iter_seed
                    .load(Ordering::Relaxed)
                    .wrapping_add(ITER_SEED_STEP),
            ),
        }
    }
}

impl<V> HashTable<V> {
    /// Creates a table able to hold `capacity` values before its first
    /// rehash.
    ///
    /// The table always has at least one group, so `with_capacity(0)` can
    /// still take a few values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use swiss_set::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let group_count = num_groups(capacity);
        Self::from_groups(alloc_groups(group_count))
    }

    /// Fallible version of [`with_capacity`](Self::with_capacity).
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let group_count = num_groups(capacity);
        Ok(Self::from_groups(Self::try_groups(group_count)?))
    }

    fn from_groups(groups: Box<[Group<V>]>) -> Self {
        let element_limit = groups.len() * MAX_AVG_GROUP_LOAD;
        Self {
            iter_seed: AtomicUsize::new(groups.len().wrapping_mul(ITER_SEED_STEP)),
            groups,
            resident: 0,
            dead: 0,
            element_limit,
        }
    }

    fn try_groups(group_count: usize) -> Result<Box<[Group<V>]>, TryReserveError> {
        let layout =
            Layout::array::<Group<V>>(group_count).map_err(|_| TryReserveError::CapacityOverflow)?;
        try_alloc_groups(group_count).map_err(|_| TryReserveError::AllocError { layout })
    }

    /// Mixes `seed` into the counter that picks iteration start groups.
    pub(crate) fn seed_iteration(&mut self, seed: u64) {
        *self.iter_seed.get_mut() ^= seed as usize;
    }

    /// Returns the number of values in the table.
    ///
    /// Tombstones are not counted.
    pub fn len(&self) -> usize {
        self.resident - self.dead
    }

    /// Returns `true` if the table contains no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many more values can be inserted before an insert forces a
    /// rehash.
    ///
    /// Removals that leave a tombstone do not give headroom back; only a
    /// rehash or [`clear`](Self::clear) reclaims those slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use swiss_set::hash_table::HashTable;
    /// # use swiss_set::hash_table::MAX_AVG_GROUP_LOAD;
    /// #
    /// let table: HashTable<u32> = HashTable::with_capacity(0);
    /// assert_eq!(table.capacity(), MAX_AVG_GROUP_LOAD);
    /// ```
    pub fn capacity(&self) -> usize {
        self.element_limit - self.resident
    }

    /// Fraction of raw slots holding live values.
    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / (self.groups.len() * GROUP_WIDTH) as f32
    }

    /// Number of groups in the group array.
    #[cfg(any(test, feature = "stats"))]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of tombstoned slots.
    #[cfg(any(test, feature = "stats"))]
    pub fn tombstones(&self) -> usize {
        self.dead
    }

    /// Resident count at which the next insert forces a rehash.
    #[cfg(any(test, feature = "stats"))]
    pub fn element_limit(&self) -> usize {
        self.element_limit
    }

    #[inline(always)]
    fn home_group(&self, h1: u64) -> usize {
        (h1 % self.groups.len() as u64) as usize
    }

    #[inline(always)]
    fn next_group(&self, group: usize) -> usize {
        let next = group + 1;
        if next == self.groups.len() { 0 } else { next }
    }

    /// Walks the probe sequence for `hash`.
    ///
    /// Returns `Ok` with the slot holding a value accepted by `eq`, or `Err`
    /// with the first empty slot on the path. Terminates because the load
    /// limit keeps at least one empty slot in the table.
    #[inline]
    fn find_or_empty(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Result<Slot, Slot> {
        let (h1, tag) = split_hash(hash);
        let mut group = self.home_group(h1);
        let mut probed = 0;
        loop {
            let g = &self.groups[group];
            for lane in Backend::match_tag(&g.ctrl, tag) {
                // Tag collisions are resolved by equality.
                if let Some(v) = &g.slots[lane]
                    && eq(v)
                {
                    return Ok(Slot { group, lane });
                }
            }

            if let Some(lane) = Backend::match_empty(&g.ctrl).lowest() {
                return Err(Slot { group, lane });
            }

            probed += 1;
            debug_assert!(probed <= self.groups.len(), "probe sequence did not terminate");
            group = self.next_group(group);
        }
    }

    /// Places a value known to be absent into the first empty slot on its
    /// probe path, skipping the equality scan.
    fn place_unique(&mut self, hash: u64, value: V) -> Slot {
        let (h1, tag) = split_hash(hash);
        let mut group = self.home_group(h1);
        loop {
            if let Some(lane) = Backend::match_empty(&self.groups[group].ctrl).lowest() {
                self.groups[group].occupy(lane, tag, value);
                self.resident += 1;
                return Slot { group, lane };
            }
            group = self.next_group(group);
        }
    }

    /// Removes the value at `slot`.
    ///
    /// If the slot's group still has an empty lane, every probe passing
    /// through this group already stops there, so the slot can become empty
    /// too. Otherwise it becomes a tombstone so probes keep walking past it.
    fn remove_at(&mut self, slot: Slot) -> V {
        let group = &mut self.groups[slot.group];
        let tombstone = !Backend::match_empty(&group.ctrl).any();
        let value = group.vacate(slot.lane, tombstone);
        if tombstone {
            self.dead += 1;
        } else {
            self.resident -= 1;
        }
        value
    }

    fn value_at(&self, slot: Slot) -> &V {
        match &self.groups[slot.group].slots[slot.lane] {
            Some(value) => value,
            None => unreachable!("occupied slot without a value"),
        }
    }

    fn value_at_mut(&mut self, slot: Slot) -> &mut V {
        match &mut self.groups[slot.group].slots[slot.lane] {
            Some(value) => value,
            None => unreachable!("occupied slot without a value"),
        }
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hasher;
    /// #
    /// # use siphasher::sip::SipHasher;
    /// # use swiss_set::hash_table::HashTable;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     hasher.write_u64(n);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table
    ///     .entry(hash_u64(42), |&n: &u64| n == 42, |&n| hash_u64(n))
    ///     .or_insert(42);
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let slot = self.find_or_empty(hash, eq).ok()?;
        Some(self.value_at(slot))
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    ///
    /// The caller must not change the value in a way that changes its hash or
    /// its equality with other values.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let slot = self.find_or_empty(hash, eq).ok()?;
        Some(self.value_at_mut(slot))
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hasher;
    /// #
    /// # use siphasher::sip::SipHasher;
    /// # use swiss_set::hash_table::HashTable;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     hasher.write_u64(n);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table
    ///     .entry(hash_u64(42), |&n: &u64| n == 42, |&n| hash_u64(n))
    ///     .or_insert(42);
    ///
    /// assert_eq!(table.remove(hash_u64(42), |&n| n == 42), Some(42));
    /// assert_eq!(table.remove(hash_u64(42), |&n| n == 42), None);
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let slot = self.find_or_empty(hash, eq).ok()?;
        Some(self.remove_at(slot))
    }

    /// Gets the entry for `hash` and `eq`, rehashing first if the table is at
    /// its load limit.
    ///
    /// `hasher` recomputes the hash of stored values and is only called when a
    /// rehash happens. It must agree with `hash`.
    #[inline]
    pub fn entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Entry<'_, V> {
        if self.needs_rehash() {
            self.rehash(self.next_group_count(), hasher);
        }

        match self.find_or_empty(hash, eq) {
            Ok(slot) => Entry::Occupied(OccupiedEntry { table: self, slot }),
            Err(slot) => Entry::Vacant(VacantEntry {
                table: self,
                slot,
                tag: split_hash(hash).1,
            }),
        }
    }

    /// Inserts a value the caller knows is not in the table, rehashing first
    /// if the table is at its load limit.
    ///
    /// No equality checks are made; inserting a duplicate leaves both copies
    /// in the table.
    pub fn insert_unique(
        &mut self,
        hash: u64,
        value: V,
        hasher: impl Fn(&V) -> u64,
    ) -> &mut V {
        if self.needs_rehash() {
            self.rehash(self.next_group_count(), hasher);
        }
        let slot = self.place_unique(hash, value);
        self.value_at_mut(slot)
    }

    /// Returns `true` when the next insert must rehash first.
    #[inline(always)]
    pub fn needs_rehash(&self) -> bool {
        self.resident >= self.element_limit
    }

    /// Group count for the next forced rehash.
    ///
    /// When tombstones make up at least half of the resident slots the
    /// rehash is a compaction at the current size; otherwise the group count
    /// doubles.
    pub fn next_group_count(&self) -> usize {
        let current = self.groups.len();
        if self.dead >= self.resident / 2 {
            current
        } else {
            current.checked_mul(2).unwrap_or_else(|| capacity_overflow())
        }
    }

    /// Moves every live value into a fresh array of `group_count` groups,
    /// dropping all tombstones.
    ///
    /// `hasher` gives each value's hash for the new array; it may differ from
    /// the hash used so far, which is how callers switch hash functions. The
    /// group count is raised if it could not hold the current values.
    #[cold]
    pub fn rehash(&mut self, group_count: usize, hasher: impl Fn(&V) -> u64) {
        let group_count = group_count.max(num_groups(self.len()));
        self.rehash_into(alloc_groups(group_count), hasher);
    }

    fn rehash_into(&mut self, groups: Box<[Group<V>]>, hasher: impl Fn(&V) -> u64) {
        let live = self.len();
        log::trace!(
            "{} swiss table: {} -> {} groups ({} resident, {} tombstones)",
            match groups.len().cmp(&self.groups.len()) {
                core::cmp::Ordering::Greater => "growing",
                core::cmp::Ordering::Equal => "compacting",
                core::cmp::Ordering::Less => "shrinking",
            },
            self.groups.len(),
            groups.len(),
            self.resident,
            self.dead,
        );

        let old = core::mem::replace(&mut self.groups, groups);
        self.element_limit = self.groups.len() * MAX_AVG_GROUP_LOAD;
        self.resident = 0;
        self.dead = 0;

        for mut group in old.into_vec() {
            for lane in Backend::match_full(&group.ctrl) {
                if let Some(value) = group.slots[lane].take() {
                    let hash = hasher(&value);
                    self.place_unique(hash, value);
                }
            }
        }

        debug_assert_eq!(self.resident, live);
        debug_assert!(self.resident <= self.element_limit);
    }

    /// Makes room for at least `additional` more inserts without a forced
    /// rehash.
    ///
    /// # Panics
    ///
    /// Panics if the new group count overflows `usize`. Aborts on allocation
    /// failure.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&V) -> u64) {
        if let Some(group_count) = self.reserve_group_count(additional) {
            let group_count = group_count.unwrap_or_else(|_| capacity_overflow());
            log::debug!("reserving {additional} slots: {group_count} groups");
            self.rehash_into(alloc_groups(group_count), hasher);
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<(), TryReserveError> {
        if let Some(group_count) = self.reserve_group_count(additional) {
            let groups = Self::try_groups(group_count?)?;
            log::debug!("reserving {additional} slots: {} groups", groups.len());
            self.rehash_into(groups, hasher);
        }
        Ok(())
    }

    /// `None` when the current headroom already covers `additional`.
    fn reserve_group_count(&self, additional: usize) -> Option<Result<usize, TryReserveError>> {
        if additional <= self.capacity() {
            return None;
        }
        let group_count = self
            .len()
            .checked_add(additional)
            .filter(|&required| required.checked_add(MAX_AVG_GROUP_LOAD).is_some())
            .map(|required| num_groups(required).max(self.groups.len()))
            .ok_or(TryReserveError::CapacityOverflow);
        Some(group_count)
    }

    /// Rehashes into the smallest group array that holds the current values
    /// without exceeding the load limit. Never goes below one group.
    pub fn shrink_to_fit(&mut self, hasher: impl Fn(&V) -> u64) {
        let group_count = num_groups(self.len());
        if group_count < self.groups.len() {
            log::debug!(
                "shrinking swiss table from {} to {group_count} groups",
                self.groups.len()
            );
            self.rehash_into(alloc_groups(group_count), hasher);
        }
    }

    /// Removes every value, keeping the group array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use swiss_set::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table.entry(1, |&n: &u64| n == 1, |&n| n).or_insert(1);
    /// table.entry(2, |&n: &u64| n == 2, |&n| n).or_insert(2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert!(table.capacity() >= 10);
    /// ```
    pub fn clear(&mut self) {
        for group in self.groups.iter_mut() {
            group.reset();
        }
        self.resident = 0;
        self.dead = 0;
    }

    /// Keeps only the values for which `f` returns `true`.
    ///
    /// Removed slots follow the same empty-or-tombstone rule as
    /// [`remove`](Self::remove).
    pub fn retain(&mut self, mut f: impl FnMut(&V) -> bool) {
        for group in 0..self.groups.len() {
            for lane in Backend::match_full(&self.groups[group].ctrl) {
                let slot = Slot { group, lane };
                if !f(self.value_at(slot)) {
                    self.remove_at(slot);
                }
            }
        }
    }

    /// Returns an iterator over all values, starting at a random group.
    ///
    /// Every value is yielded exactly once. The start group changes from one
    /// call to the next so no group is systematically visited first.
    pub fn iter(&self) -> Iter<'_, V> {
        let seed = self.iter_seed.fetch_add(ITER_SEED_STEP, Ordering::Relaxed);
        self.iter_with_rng(&mut SmallRng::seed_from_u64(seed as u64))
    }

    /// Returns an iterator whose start group is drawn from `rng`.
    pub fn iter_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Iter<'_, V> {
        self.iter_from(rng.random_range(0..self.groups.len()))
    }

    /// Returns an iterator that starts at `start_group` (modulo the group
    /// count) and wraps once around the group array.
    pub fn iter_from(&self, start_group: usize) -> Iter<'_, V> {
        let group = start_group % self.groups.len();
        Iter {
            groups: &self.groups,
            group,
            groups_left: self.groups.len() - 1,
            lanes: Backend::match_full(&self.groups[group].ctrl),
            remaining: self.len(),
        }
    }

    /// Returns an iterator that removes and yields every value.
    ///
    /// Values not consumed before the iterator is dropped are dropped with
    /// it, and the table ends up cleared.
    pub fn drain(&mut self) -> Drain<'_, V> {
        let lanes = Backend::match_full(&self.groups[0].ctrl);
        Drain {
            table: self,
            group: 0,
            lanes,
        }
    }

    /// Computes a histogram of probe distances.
    ///
    /// Bin `d` counts values stored `d` groups past their home group. The
    /// vector is as long as the largest distance plus one.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self, hasher: impl Fn(&V) -> u64) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        let groups = self.groups.len();
        for (index, group) in self.groups.iter().enumerate() {
            for lane in Backend::match_full(&group.ctrl) {
                let (h1, _) = split_hash(hasher(self.value_at(Slot { group: index, lane })));
                let distance = (index + groups - self.home_group(h1)) % groups;
                if distance >= hist.len() {
                    hist.resize(distance + 1, 0);
                }
                hist[distance] += 1;
            }
        }
        hist
    }

    /// Pretty-prints the probe-distance histogram using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_probe_histogram(&self, hasher: impl Fn(&V) -> u64) {
        let hist = self.probe_histogram(hasher);
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("probe histogram ({} entries):", self.len());
        for (distance, &count) in hist.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", distance, "█".repeat(width), count);
        }
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let total_slots = self.groups.len() * GROUP_WIDTH;
        let mut empty_slots = 0;
        let mut full_groups = 0;
        for group in self.groups.iter() {
            let empty = Backend::match_empty(&group.ctrl).count_lanes();
            empty_slots += empty;
            if empty == 0 {
                full_groups += 1;
            }
        }

        DebugStats {
            len: self.len(),
            resident: self.resident,
            tombstones: self.dead,
            element_limit: self.element_limit,
            group_count: self.groups.len(),
            total_slots,
            empty_slots,
            full_groups,
            load_factor: self.len() as f64 / total_slots as f64,
            slot_utilization: self.resident as f64 / total_slots as f64,
            total_bytes: core::mem::size_of_val::<[Group<V>]>(&self.groups),
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// Constructed by [`HashTable::entry`].
pub enum Entry<'a, V> {
    /// A value matching the predicate is present.
    Occupied(OccupiedEntry<'a, V>),
    /// No matching value; holds the slot an insert would fill.
    Vacant(VacantEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if vacant and returns a mutable reference to the
    /// value in the entry.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Like [`or_insert`](Self::or_insert), computing the value only when the
    /// entry is vacant.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A vacant entry: the first empty slot on the probe path.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    slot: Slot,
    tag: Tag,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Writes `value` into the slot and returns a reference to it.
    ///
    /// The value must hash to the hash this entry was looked up with.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { table, slot, tag } = self;
        table.resident += 1;
        debug_assert!(table.resident <= table.element_limit);
        table.groups[slot.group].occupy(slot.lane, tag, value)
    }
}

/// An occupied entry.
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    slot: Slot,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.table.value_at(self.slot)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_at_mut(self.slot)
    }

    /// Converts the entry into a mutable reference bound to the table.
    pub fn into_mut(self) -> &'a mut V {
        self.table.value_at_mut(self.slot)
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        self.table.remove_at(self.slot)
    }
}

/// An iterator over the values of a [`HashTable`].
///
/// Scans a fixed snapshot of the group array, starting at one group and
/// wrapping once around it; within a group lanes are visited in ascending
/// order.
pub struct Iter<'a, V> {
    groups: &'a [Group<V>],
    group: usize,
    groups_left: usize,
    lanes: BitMask,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            groups: self.groups,
            group: self.group,
            groups_left: self.groups_left,
            lanes: self.lanes,
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let groups = self.groups;
        loop {
            if let Some(lane) = self.lanes.take_lowest() {
                if let Some(value) = &groups[self.group].slots[lane] {
                    self.remaining -= 1;
                    return Some(value);
                }
                continue;
            }

            if self.groups_left == 0 {
                return None;
            }
            self.groups_left -= 1;
            self.group += 1;
            if self.group == groups.len() {
                self.group = 0;
            }
            self.lanes = Backend::match_full(&groups[self.group].ctrl);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, V> {
    table: &'a mut HashTable<V>,
    group: usize,
    lanes: BitMask,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lane) = self.lanes.take_lowest() {
                return Some(self.table.remove_at(Slot {
                    group: self.group,
                    lane,
                }));
            }

            self.group += 1;
            if self.group >= self.table.groups.len() {
                return None;
            }
            self.lanes = Backend::match_full(&self.table.groups[self.group].ctrl);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.table.len();
        (n, Some(n))
    }
}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    groups: alloc::vec::IntoIter<Group<V>>,
    current: Option<Group<V>>,
    lanes: BitMask,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = &mut self.current
                && let Some(lane) = self.lanes.take_lowest()
            {
                if let Some(value) = group.slots[lane].take() {
                    self.remaining -= 1;
                    return Some(value);
                }
                continue;
            }

            let group = self.groups.next()?;
            self.lanes = Backend::match_full(&group.ctrl);
            self.current = Some(group);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        IntoIter {
            groups: self.groups.into_vec().into_iter(),
            current: None,
            lanes: BitMask::default(),
            remaining,
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
