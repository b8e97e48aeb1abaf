use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::ControlFlow;

use rand::Rng;

use crate::error::TryReserveError;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::oracle::DefaultHashBuilder;
use crate::oracle::HashOracle;

/// A hash set backed by a Swiss table.
///
/// `HashSet<T, S>` stores values of type `T` where `T` implements `Hash + Eq`,
/// hashing them with the oracle `S`. Whenever the table fills up to its load
/// limit, the next insert rehashes every live value under a freshly reseeded
/// oracle: into twice as many groups, or into the same number of groups when
/// at least half of the used slots are tombstones.
///
/// # Performance Characteristics
///
/// - **Memory**: one control byte per slot plus an `Option<T>` slot; at most
///   `MAX_AVG_GROUP_LOAD` of every 16 slots are used between rehashes.
/// - **Removal**: removing from a group that was never full is a plain delete;
///   otherwise it leaves a tombstone that only a rehash or `clear` reclaims.
#[derive(Clone)]
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug + Hash + Eq,
    S: HashOracle,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    /// Creates an empty set with the given hash oracle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::hash::RandomState;
    ///
    /// use swiss_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_hasher(RandomState::new());
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a set that holds at least `capacity` values before its first
    /// rehash, using the given hash oracle.
    ///
    /// The group count is the smallest one covering `capacity` at the
    /// configured load limit, so the actual capacity may be larger.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::hash::RandomState;
    ///
    /// use swiss_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_capacity_and_hasher(100, RandomState::new());
    /// assert!(set.capacity() >= 100);
    /// # }
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut table = HashTable::with_capacity(capacity);
        table.seed_iteration(hash_builder.hash_one(capacity));
        Self {
            table,
            hash_builder,
        }
    }

    /// Returns a reference to the set's current hash oracle.
    ///
    /// The oracle is replaced on every rehash.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of values in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns how many more values can be inserted before the next insert
    /// forces a rehash.
    ///
    /// Removing a value does not always raise this number: removals that
    /// leave a tombstone keep their slot used until the next rehash.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::with_capacity(100);
    /// let before = set.capacity();
    /// assert!(before >= 100);
    ///
    /// set.insert(1);
    /// assert_eq!(set.capacity(), before - 1);
    /// # }
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Fraction of raw slots holding live values.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Removes all values from the set.
    ///
    /// The group array is kept, and every slot it holds, tombstones included,
    /// becomes available again.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(!set.is_empty());
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert!(!set.contains(&1));
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the group array to the smallest size that holds the current
    /// values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::with_capacity(1000);
    /// set.insert(1);
    /// set.insert(2);
    /// assert!(set.capacity() >= 1000);
    ///
    /// set.shrink_to_fit();
    ///
    /// assert!(set.capacity() < 1000);
    /// assert!(set.contains(&1) && set.contains(&2));
    /// # }
    /// ```
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit(|v| self.hash_builder.hash_one(v));
    }

    /// Reserves room for at least `additional` more inserts without a forced
    /// rehash.
    ///
    /// If the table has to grow, values are rehashed under a reseeded oracle.
    ///
    /// # Panics
    ///
    /// Panics if the new group count overflows `usize`.
    pub fn reserve(&mut self, additional: usize) {
        if additional > self.table.capacity() {
            let oracle = self.hash_builder.reseed();
            self.table.reserve(additional, |v| oracle.hash_one(v));
            self.hash_builder = oracle;
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    ///
    /// On error the set is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    /// use swiss_set::TryReserveError;
    ///
    /// let mut set: HashSet<u64> = HashSet::new();
    /// assert!(set.try_reserve(64).is_ok());
    /// assert_eq!(
    ///     set.try_reserve(usize::MAX),
    ///     Err(TryReserveError::CapacityOverflow)
    /// );
    /// # }
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        if additional > self.table.capacity() {
            let oracle = self.hash_builder.reseed();
            self.table.try_reserve(additional, |v| oracle.hash_one(v))?;
            self.hash_builder = oracle;
        }
        Ok(())
    }

    /// Rehashes under a reseeded oracle if the table is at its load limit.
    fn rehash_if_full(&mut self) {
        if self.table.needs_rehash() {
            let group_count = self.table.next_group_count();
            let oracle = self.hash_builder.reseed();
            self.table.rehash(group_count, |v| oracle.hash_one(v));
            self.hash_builder = oracle;
        }
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain this value, `true` is returned.
    /// - If the set already contained this value, `false` is returned.
    ///
    /// An insert made while the set is at its load limit rehashes first, even
    /// if the value turns out to be present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        self.rehash_if_full();
        let hash = self.hash_builder.hash_one(&value);
        match self
            .table
            .entry(hash, |v| v == &value, |v| self.hash_builder.hash_one(v))
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// # }
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value).is_some()
    }

    /// Removes a value from the set. Returns whether the value was
    /// present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// # }
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value).is_some()
    }

    /// Adds a value to the set, replacing the existing value, if any, that is
    /// equal to the given one. Returns the replaced value.
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.rehash_if_full();
        let hash = self.hash_builder.hash_one(&value);
        match self
            .table
            .entry(hash, |v| v == &value, |v| self.hash_builder.hash_one(v))
        {
            Entry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value)
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Calls `visitor` on every value until it returns
    /// [`ControlFlow::Break`].
    ///
    /// Values are visited in [`iter`](Self::iter) order. Returns the break
    /// value, or [`ControlFlow::Continue`] if every value was visited.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use core::ops::ControlFlow;
    ///
    /// use swiss_set::HashSet;
    ///
    /// let set: HashSet<u32> = (0..100).collect();
    ///
    /// let mut seen = 0;
    /// let found = set.for_each(|&v| {
    ///     seen += 1;
    ///     if v % 7 == 3 {
    ///         ControlFlow::Break(v)
    ///     } else {
    ///         ControlFlow::Continue(())
    ///     }
    /// });
    ///
    /// assert!(matches!(found, ControlFlow::Break(v) if v % 7 == 3));
    /// assert!(seen <= 100);
    /// # }
    /// ```
    pub fn for_each<B>(&self, mut visitor: impl FnMut(&T) -> ControlFlow<B>) -> ControlFlow<B> {
        self.iter().try_for_each(|v| visitor(v))
    }

    /// Returns an iterator over the values of the set.
    ///
    /// Each call starts at a pseudo-randomly chosen group, so the order
    /// differs between calls; every value is still yielded exactly once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let mut values: Vec<_> = set.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [1, 2]);
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator whose start group is drawn from `rng`.
    ///
    /// Two calls with identically seeded generators on an unchanged set yield
    /// the same order.
    pub fn iter_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter_with_rng(rng),
        }
    }

    /// Returns an iterator that removes and yields all values from the
    /// set.
    ///
    /// Values not consumed before the iterator is dropped are dropped with
    /// it; the set is empty afterwards either way.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let values: Vec<_> = set.drain().collect();
    /// assert!(set.is_empty());
    /// assert_eq!(values.len(), 2);
    /// # }
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Retains only the values for which `f` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let mut set: HashSet<i32> = (1..=4).collect();
    ///
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains(&2));
    /// assert!(set.contains(&4));
    /// # }
    /// ```
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.table.retain(f);
    }

    /// Returns `true` if the set contains no elements in common with `other`.
    pub fn is_disjoint(&self, other: &HashSet<T, S>) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if `other` contains at least all the values in `self`.
    pub fn is_subset(&self, other: &HashSet<T, S>) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if `self` contains at least all the values in `other`.
    pub fn is_superset(&self, other: &HashSet<T, S>) -> bool {
        other.is_subset(self)
    }

    /// Visits the values in `self` or `other`, without duplicates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let b: HashSet<i32> = [3, 4].into_iter().collect();
    ///
    /// let mut union: Vec<_> = a.union(&b).copied().collect();
    /// union.sort();
    /// assert_eq!(union, [1, 2, 3, 4]);
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a HashSet<T, S>) -> Union<'a, T, S> {
        Union {
            iter: self.iter().chain(other.difference(self)),
        }
    }

    /// Visits the values in both `self` and `other`.
    pub fn intersection<'a>(&'a self, other: &'a HashSet<T, S>) -> Intersection<'a, T, S> {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        Intersection {
            iter: small.iter(),
            other: large,
        }
    }

    /// Visits the values in `self` but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a HashSet<T, S>) -> Difference<'a, T, S> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Visits the values in exactly one of `self` and `other`.
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a HashSet<T, S>,
    ) -> SymmetricDifference<'a, T, S> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }

    /// Returns detailed statistics about the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Histogram of how many groups past their home group values sit.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table
            .probe_histogram(|v| self.hash_builder.hash_one(v))
    }

    /// Pretty-prints the probe-distance histogram using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_probe_histogram(&self) {
        self.table
            .print_probe_histogram(|v| self.hash_builder.hash_one(v));
    }

    /// Number of groups in the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn group_count(&self) -> usize {
        self.table.group_count()
    }

    /// Number of tombstoned slots in the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Used-slot count at which the next insert forces a rehash.
    #[cfg(any(test, feature = "stats"))]
    pub fn element_limit(&self) -> usize {
        self.table.element_limit()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle + Default,
{
    /// Creates an empty set using the default hash oracle.
    ///
    /// The set starts with a single group.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a set that holds at least `capacity` values before its first
    /// rehash, using the default hash oracle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use swiss_set::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::with_capacity(100);
    /// assert!(set.capacity() >= 100);
    /// # }
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T> {
    inner: crate::hash_table::Drain<'a, T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A consuming iterator over the values of a `HashSet`.
pub struct IntoIter<T> {
    inner: crate::hash_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T, S> IntoIterator for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = HashSet::with_capacity(iter.size_hint().0);
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<T, S> Extend<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for HashSet<T, S>
where
    T: Hash + Eq + Copy + 'a,
    S: HashOracle,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S> {
    iter: core::iter::Chain<Iter<'a, T>, Difference<'a, T, S>>,
}

impl<'a, T, S> Iterator for Union<'a, T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
}

impl<'a, T, S> Iterator for Intersection<'a, T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
}

impl<'a, T, S> Iterator for Difference<'a, T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<'a, T, S> {
    iter: core::iter::Chain<Difference<'a, T, S>, Difference<'a, T, S>>,
}

impl<'a, T, S> Iterator for SymmetricDifference<'a, T, S>
where
    T: Hash + Eq,
    S: HashOracle,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::hash_table::MAX_AVG_GROUP_LOAD;
    use crate::matching::GROUP_WIDTH;
    use crate::test_util::IdentityBuilder;
    use crate::test_util::SipHashBuilder;

    #[test]
    fn test_new_and_with_hasher() {
        let set: HashSet<i32, SipHashBuilder> = HashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.group_count(), 1);

        let set: HashSet<i32, _> = HashSet::with_hasher(SipHashBuilder::default());
        assert!(set.is_empty());
        assert_eq!(set.capacity(), MAX_AVG_GROUP_LOAD);
    }

    #[test]
    fn test_with_capacity() {
        let set: HashSet<i32, SipHashBuilder> = HashSet::with_capacity(10);
        assert_eq!(set.group_count(), 1);
        assert!(set.capacity() >= 10);

        let set: HashSet<i32, SipHashBuilder> = HashSet::with_capacity(1000);
        assert!(set.capacity() >= 1000);
        assert_eq!(set.group_count(), 1000usize.div_ceil(MAX_AVG_GROUP_LOAD));
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 2);

        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn test_remove() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert!(set.remove(&1));
        assert!(!set.contains(&1));
        assert!(set.contains(&2));

        assert!(!set.remove(&1));
        assert!(!set.remove(&4));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_take_get_replace() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(String::from("a"));
        set.insert(String::from("b"));

        assert_eq!(set.get(&"a".to_string()).map(String::as_str), Some("a"));
        assert_eq!(set.take(&"a".to_string()), Some("a".to_string()));
        assert_eq!(set.take(&"a".to_string()), None);
        assert_eq!(set.get(&"a".to_string()), None);

        assert_eq!(set.replace("b".to_string()), Some("b".to_string()));
        assert_eq!(set.replace("c".to_string()), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        for i in 0..100 {
            set.insert(i);
        }
        let groups = set.group_count();

        set.clear();
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        assert_eq!(set.group_count(), groups);
        assert_eq!(set.capacity(), set.element_limit());
        for i in 0..100 {
            assert!(!set.contains(&i));
        }
    }

    #[test]
    fn test_reserve() {
        let mut set = HashSet::<i32, _>::with_hasher(SipHashBuilder::default());

        set.reserve(1000);
        assert!(set.capacity() >= 1000);
        assert_eq!(
            set.element_limit(),
            1000usize.div_ceil(MAX_AVG_GROUP_LOAD) * MAX_AVG_GROUP_LOAD
        );

        let groups = set.group_count();
        for i in 0..1000 {
            set.insert(i);
        }
        assert_eq!(set.group_count(), groups);
    }

    #[test]
    fn test_try_reserve() {
        let mut set: HashSet<u64, SipHashBuilder> = HashSet::new();
        set.insert(7);
        assert!(set.try_reserve(100).is_ok());
        assert!(set.capacity() >= 100);
        assert!(set.contains(&7));

        let hasher = set.hasher().clone();
        assert_eq!(
            set.try_reserve(usize::MAX),
            Err(TryReserveError::CapacityOverflow)
        );
        // A failed reservation keeps the oracle and the values.
        assert_eq!(set.hasher().hash_one(7u64), hasher.hash_one(7u64));
        assert!(set.contains(&7));
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        for i in 0..1000 {
            set.insert(i);
        }
        set.retain(|&x| x < 20);
        set.shrink_to_fit();
        assert_eq!(set.group_count(), 20usize.div_ceil(MAX_AVG_GROUP_LOAD));
        for i in 0..20 {
            assert!(set.contains(&i));
        }
    }

    #[test]
    fn test_iter() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let values: Vec<i32> = set.iter().copied().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&1));
        assert!(values.contains(&2));
        assert!(values.contains(&3));
        assert_eq!(set.iter().len(), 3);
    }

    #[test]
    fn test_iter_with_rng() {
        let set: HashSet<u32, SipHashBuilder> = (0..500).collect();
        let a: Vec<u32> = set
            .iter_with_rng(&mut SmallRng::seed_from_u64(3))
            .copied()
            .collect();
        let b: Vec<u32> = set
            .iter_with_rng(&mut SmallRng::seed_from_u64(3))
            .copied()
            .collect();
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn test_for_each_visits_every_value() {
        let set: HashSet<u32, SipHashBuilder> = (0..300).collect();
        let mut seen = Vec::new();
        let flow: ControlFlow<()> = set.for_each(|&v| {
            seen.push(v);
            ControlFlow::Continue(())
        });
        assert_eq!(flow, ControlFlow::Continue(()));
        seen.sort_unstable();
        assert_eq!(seen, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_for_each_early_stop() {
        let set: HashSet<u32, SipHashBuilder> = (0..300).collect();
        let mut calls = 0;
        let flow = set.for_each(|&v| {
            calls += 1;
            if calls == 10 {
                ControlFlow::Break(v)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(calls, 10);
        match flow {
            ControlFlow::Break(v) => assert!(set.contains(&v)),
            ControlFlow::Continue(()) => panic!("visitor asked to stop"),
        }
    }

    #[test]
    fn test_into_iterator() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let values: Vec<i32> = (&set).into_iter().copied().collect();
        assert_eq!(values.len(), 3);

        let mut owned: Vec<i32> = set.into_iter().collect();
        owned.sort_unstable();
        assert_eq!(owned, vec![1, 2, 3]);
    }

    #[test]
    fn test_drain() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let drained: Vec<i32> = set.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(set.is_empty());

        assert!(drained.contains(&1));
        assert!(drained.contains(&2));
        assert!(drained.contains(&3));

        set.insert(4);
        assert!(set.contains(&4));
    }

    #[test]
    fn test_multiple_insertions() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());

        for i in 0..100 {
            assert!(set.insert(i));
        }

        assert_eq!(set.len(), 100);

        for i in 0..100 {
            assert!(set.contains(&i));
        }

        for i in 0..100 {
            assert!(!set.insert(i));
        }

        assert_eq!(set.len(), 100);
    }

    #[test]
    fn test_collision_handling() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            assert!(set.insert(i));
        }

        assert_eq!(set.len(), 1000);

        for i in (0..1000).step_by(2) {
            assert!(set.remove(&i));
        }

        assert_eq!(set.len(), 500);

        for i in 0..1000 {
            assert_eq!(set.contains(&i), i % 2 == 1);
        }
    }

    #[test]
    fn test_random_u32_from_small_hint() {
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
        let mut set: HashSet<u32, SipHashBuilder> = HashSet::with_capacity(10);
        let mut keys = Vec::with_capacity(5000);
        while keys.len() < 5000 {
            let k: u32 = rng.random();
            if set.insert(k) {
                keys.push(k);
            }
        }

        assert_eq!(set.len(), 5000);
        for k in &keys {
            assert!(set.contains(k));
        }

        let mut misses = 0;
        for _ in 0..1000 {
            let k: u32 = rng.random();
            if !keys.contains(&k) {
                misses += 1;
                assert!(!set.contains(&k));
            }
        }
        assert!(misses > 0);
        assert!(set.debug_stats().resident <= set.element_limit());
    }

    #[test]
    fn test_capacity_boundary() {
        let mut set: HashSet<u64, SipHashBuilder> = HashSet::with_capacity(10);
        assert_eq!(set.group_count(), 1);

        for i in 0..MAX_AVG_GROUP_LOAD as u64 {
            set.insert(i);
        }
        assert_eq!(set.group_count(), 1);
        assert_eq!(set.capacity(), 0);

        set.insert(1_000);
        assert_eq!(set.group_count(), 2);
        assert_eq!(set.len(), MAX_AVG_GROUP_LOAD + 1);
        assert_eq!(set.capacity(), 2 * MAX_AVG_GROUP_LOAD - set.len());
    }

    #[test]
    fn test_growth_reseeds_oracle() {
        let mut set: HashSet<u64, SipHashBuilder> = HashSet::with_capacity(0);
        let before = set.hasher().clone();
        for i in 0..=MAX_AVG_GROUP_LOAD as u64 {
            set.insert(i);
        }
        let after = set.hasher();
        assert!((0u64..8).any(|k| before.hash_one(k) != after.hash_one(k)));
        for i in 0..=MAX_AVG_GROUP_LOAD as u64 {
            assert!(set.contains(&i));
        }
    }

    #[test]
    fn test_insert_present_key_at_limit_still_rehashes() {
        let mut set: HashSet<u64, SipHashBuilder> =
            HashSet::with_hasher(SipHashBuilder::with_keys(3, 4));
        for i in 0..MAX_AVG_GROUP_LOAD as u64 {
            set.insert(i);
        }
        assert_eq!(set.group_count(), 1);
        assert_eq!(set.capacity(), 0);

        assert!(!set.insert(0));
        assert_eq!(set.len(), MAX_AVG_GROUP_LOAD);
        assert_eq!(set.group_count(), 2);
        let before = SipHashBuilder::with_keys(3, 4);
        assert!((0u64..8).any(|k| before.hash_one(k) != set.hasher().hash_one(k)));
        for i in 0..MAX_AVG_GROUP_LOAD as u64 {
            assert!(set.contains(&i));
        }
    }

    #[test]
    fn test_oracle_kept_without_rehash() {
        let mut set: HashSet<u64, SipHashBuilder> =
            HashSet::with_hasher(SipHashBuilder::with_keys(1, 2));
        set.insert(5);
        set.remove(&5);
        set.clear();
        let expected = SipHashBuilder::with_keys(1, 2);
        assert_eq!(set.hasher().hash_one(9u64), expected.hash_one(9u64));
    }

    /// Keys `(round * groups + home) << 7 | tag` land in group `home` with
    /// the given tag under the identity oracle.
    fn placed(home: u64, tag: u64, round: u64, groups: u64) -> u64 {
        ((round * groups + home) << 7) | tag
    }

    #[test]
    fn test_tombstone_keeps_probe_path() {
        let mut set: HashSet<u64, IdentityBuilder> =
            HashSet::with_capacity_and_hasher(MAX_AVG_GROUP_LOAD * 2, IdentityBuilder::default());
        let groups = set.group_count() as u64;
        assert_eq!(groups, 2);

        for tag in 0..GROUP_WIDTH as u64 {
            assert!(set.insert(placed(0, tag, 0, groups)));
        }
        // Home group 0 is full, so this key lives in group 1.
        let spilled = placed(0, 0x40, 1, groups);
        assert!(set.insert(spilled));

        let resident = set.debug_stats().resident;
        assert!(set.remove(&placed(0, 9, 0, groups)));
        assert_eq!(set.tombstones(), 1);
        assert_eq!(set.debug_stats().resident, resident);
        assert!(set.contains(&spilled));
        assert!(!set.contains(&placed(0, 9, 0, groups)));
    }

    #[test]
    fn test_hard_delete_reclaims_headroom() {
        let mut set: HashSet<u64, IdentityBuilder> =
            HashSet::with_capacity_and_hasher(MAX_AVG_GROUP_LOAD * 2, IdentityBuilder::default());
        let groups = set.group_count() as u64;
        set.insert(placed(1, 1, 0, groups));
        set.insert(placed(1, 2, 0, groups));
        let capacity = set.capacity();
        assert!(set.remove(&placed(1, 1, 0, groups)));
        assert_eq!(set.tombstones(), 0);
        assert_eq!(set.capacity(), capacity + 1);
    }

    #[test]
    fn test_compaction_when_half_tombstones() {
        let mut set: HashSet<u64, IdentityBuilder> =
            HashSet::with_capacity_and_hasher(MAX_AVG_GROUP_LOAD * 2, IdentityBuilder::default());
        let groups = set.group_count() as u64;
        for tag in 0..GROUP_WIDTH as u64 {
            set.insert(placed(0, tag, 0, groups));
        }
        for tag in 0..14 {
            assert!(set.remove(&placed(0, tag, 0, groups)));
        }
        assert_eq!(set.tombstones(), 14);

        let mut round = 1;
        while set.capacity() > 0 {
            set.insert(placed(1, 3, round, groups));
            round += 1;
        }
        set.insert(placed(1, 4, 0, groups));

        assert_eq!(set.group_count(), 2);
        assert_eq!(set.tombstones(), 0);
        assert!(set.contains(&placed(0, 14, 0, groups)));
        assert!(set.contains(&placed(0, 15, 0, groups)));
        assert!(set.contains(&placed(1, 4, 0, groups)));
    }

    #[test]
    fn test_tag_collisions() {
        let mut set: HashSet<u64, IdentityBuilder> =
            HashSet::with_capacity_and_hasher(64, IdentityBuilder::default());
        let groups = set.group_count() as u64;
        let keys: Vec<u64> = (0..8).map(|round| placed(2, 0x11, round, groups)).collect();
        for &k in &keys {
            assert!(set.insert(k));
        }
        for &k in &keys {
            assert!(set.contains(&k));
        }
        assert!(!set.contains(&placed(2, 0x11, 99, groups)));
        assert!(set.remove(&keys[3]));
        assert!(!set.contains(&keys[3]));
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn test_string_values() {
        let mut set = HashSet::with_hasher(SipHashBuilder::default());

        assert!(set.insert("hello".to_string()));
        assert!(set.insert("world".to_string()));
        assert!(!set.insert("hello".to_string()));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&"hello".to_string()));
        assert!(!set.contains(&"missing".to_string()));
    }

    #[test]
    fn test_default_trait() {
        let set: HashSet<i32, SipHashBuilder> = HashSet::default();
        assert!(set.is_empty());
    }

    #[test]
    fn test_eq_debug_clone() {
        let a: HashSet<i32, SipHashBuilder> = (0..10).collect();
        let mut b: HashSet<i32, SipHashBuilder> = (0..10).rev().collect();
        assert_eq!(a, b);

        let c = a.clone();
        assert_eq!(a, c);

        b.remove(&3);
        assert_ne!(a, b);

        let single: HashSet<i32, SipHashBuilder> = core::iter::once(42).collect();
        assert_eq!(alloc::format!("{single:?}"), "{42}");
    }

    #[test]
    fn test_extend() {
        let mut set: HashSet<i32, SipHashBuilder> = HashSet::new();
        set.extend(vec![1, 2, 3]);
        set.extend(&[3, 4]);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_retain() {
        let mut set: HashSet<i32, SipHashBuilder> = (0..500).collect();
        set.retain(|&x| x % 3 == 0);
        assert_eq!(set.len(), 167);
        for i in 0..500 {
            assert_eq!(set.contains(&i), i % 3 == 0);
        }
    }

    #[test]
    fn test_is_disjoint_subset_superset() {
        let a: HashSet<i32, SipHashBuilder> = [1, 2].into_iter().collect();
        let b: HashSet<i32, SipHashBuilder> = [3, 4].into_iter().collect();
        let c: HashSet<i32, SipHashBuilder> = [1, 2, 3].into_iter().collect();

        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
        assert!(a.is_subset(&c));
        assert!(!c.is_subset(&a));
        assert!(c.is_superset(&a));
        assert!(!b.is_superset(&a));
    }

    #[test]
    fn test_set_algebra() {
        let a: HashSet<i32, SipHashBuilder> = [1, 2, 3].into_iter().collect();
        let b: HashSet<i32, SipHashBuilder> = [2, 3, 4].into_iter().collect();

        fn sorted<'a>(iter: impl Iterator<Item = &'a i32>) -> Vec<i32> {
            let mut v: Vec<i32> = iter.copied().collect();
            v.sort_unstable();
            v
        }

        assert_eq!(sorted(a.union(&b)), vec![1, 2, 3, 4]);
        assert_eq!(sorted(a.intersection(&b)), vec![2, 3]);
        assert_eq!(sorted(a.difference(&b)), vec![1]);
        assert_eq!(sorted(a.symmetric_difference(&b)), vec![1, 4]);
    }

    #[test]
    fn test_stats_passthrough() {
        let set: HashSet<u32, SipHashBuilder> = (0..200).collect();
        let hist = set.probe_histogram();
        assert_eq!(hist.iter().sum::<usize>(), 200);
        let stats = set.debug_stats();
        assert_eq!(stats.len, 200);
        assert_eq!(stats.group_count, set.group_count());
        assert!(set.load_factor() > 0.0);
    }

    #[cfg(feature = "std")]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_matches_std_hash_set() {
        use rand::Rng;

        let mut rng = SmallRng::seed_from_u64(0xD1FF);
        let mut ours: HashSet<u16, SipHashBuilder> = HashSet::new();
        let mut reference = std::collections::HashSet::new();

        for _ in 0..50_000 {
            let key: u16 = rng.random_range(0..2048);
            match rng.random_range(0..10) {
                0..=5 => assert_eq!(ours.insert(key), reference.insert(key)),
                6..=8 => assert_eq!(ours.remove(&key), reference.remove(&key)),
                _ => assert_eq!(ours.contains(&key), reference.contains(&key)),
            }
            assert_eq!(ours.len(), reference.len());
        }

        let mut a: Vec<u16> = ours.iter().copied().collect();
        let mut b: Vec<u16> = reference.into_iter().collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
