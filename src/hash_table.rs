use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::iter::Rev;
use core::iter::Zip;
use core::mem;
use core::slice;

use crate::config::Config;
use crate::error::Error;
use crate::raw::RawTable;
pub use crate::raw::Slot;
use crate::strategy::DefaultStrategy;
use crate::strategy::Key;
use crate::strategy::Strategy;
use crate::table::Table;

/// An open-addressing hash table with linear probing.
///
/// `HashTable<K, V, S>` stores keys of a primitive-like type `K` (see
/// [`Key`]) in a flat array, with values of type `V` in a parallel array. No
/// entry is boxed and there is no per-slot metadata: an empty slot is one
/// whose key is the type's zero value, and the zero key itself is kept in a
/// dedicated slot past the end of the probed region.
///
/// Hashing and equality go through the strategy `S`, which defaults to the
/// key's natural hash and equality. Removal uses backward-shift deletion, so
/// the table never accumulates tombstones, and the table shrinks again once
/// it becomes sparse.
///
/// ## Performance Characteristics
///
/// - **Memory**: `size_of::<K>() + size_of::<V>()` per slot, with at most
///   `load_factor` of the slots occupied.
/// - **Lookups**: expected O(1) under the load factor, O(n) worst case under
///   adversarial collisions.
///
/// ## Example
///
/// ```rust
/// use opal_hash::HashTable;
///
/// let mut table: HashTable<i64, f64> = HashTable::new();
/// table.insert(0, 1.5);
/// table.insert(-7, 2.5);
///
/// assert_eq!(table.get(&0), Some(&1.5));
/// assert_eq!(table.remove(&-7), Some(2.5));
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, S = DefaultStrategy> {
    raw: RawTable<K, V, S>,
}

impl<K, V, S> Debug for HashTable<K, V, S>
where
    K: Key + Debug,
    V: Default + Debug,
    S: Strategy<K>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> HashTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    /// Creates an empty table sized for the default number of entries.
    pub fn new() -> Self {
        Self::with_strategy(DefaultStrategy)
    }

    /// Creates an empty table able to hold `expected` entries without
    /// growing.
    ///
    /// # Panics
    ///
    /// Panics if `expected` needs more than the maximum table size.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::HashTable;
    /// #
    /// let table: HashTable<u32, u8> = HashTable::with_capacity(100);
    /// assert!(table.max_fill() >= 100);
    /// assert!(table.capacity().is_power_of_two());
    /// ```
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_strategy(expected, DefaultStrategy)
    }
}

impl<K, V> Default for HashTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    /// Creates an empty table using `strategy` for hashing and equality.
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_capacity_and_strategy(Config::new().expected, strategy)
    }

    /// Creates an empty table able to hold `expected` entries, using
    /// `strategy`.
    ///
    /// # Panics
    ///
    /// Panics if `expected` needs more than the maximum table size.
    pub fn with_capacity_and_strategy(expected: usize, strategy: S) -> Self {
        match Self::try_with_config(Config::new().expected(expected), strategy) {
            Ok(table) => table,
            Err(err) => panic!("invalid table configuration: {err}"),
        }
    }

    /// Creates an empty table from a full configuration.
    ///
    /// Fails with [`Error::InvalidLoadFactor`] or
    /// [`Error::CapacityOverflow`] when the configuration is unusable; no
    /// table is created in that case.
    pub fn try_with_config(config: Config, strategy: S) -> Result<Self, Error> {
        Ok(Self {
            raw: RawTable::new(&config, strategy)?,
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the number of slots in the probed region. Always a power of
    /// two.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of entries at which the table grows.
    pub fn max_fill(&self) -> usize {
        self.raw.max_fill()
    }

    /// Returns the load factor the table was created with.
    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor()
    }

    /// Returns the strategy used for hashing and equality.
    pub fn strategy(&self) -> &S {
        self.raw.strategy()
    }

    /// Probes for `key`, returning either the slot holding it or the slot it
    /// would be inserted at.
    ///
    /// The vacant index is only valid until the next mutation of the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::HashTable;
    /// # use opal_hash::Slot;
    /// #
    /// let mut table: HashTable<u16, u16> = HashTable::new();
    /// let index = match table.find(&5) {
    ///     Slot::Vacant(index) => index,
    ///     Slot::Occupied(_) => unreachable!(),
    /// };
    /// table.insert_at(index, 5, 50);
    /// assert_eq!(table.find(&5), Slot::Occupied(index));
    /// ```
    pub fn find(&self, key: &K) -> Slot {
        self.raw.find(key)
    }

    /// Writes a new entry into the slot reported vacant by the preceding
    /// [`HashTable::find`] call, growing the table if it reached its fill
    /// limit. Returns the stored value, wherever growth moved it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a vacant slot, or if the table cannot grow.
    pub fn insert_at(&mut self, index: usize, key: K, value: V) -> &mut V {
        self.raw.put(index, key, value);
        let index = if self.raw.needs_grow() {
            self.grow(index)
        } else {
            index
        };
        &mut self.raw.values[index]
    }

    /// Removes the entry in slot `index` and returns its value. May shrink
    /// the table.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not hold an entry.
    pub fn remove_at(&mut self, index: usize) -> V {
        self.remove_entry_at(index).1
    }

    fn remove_entry_at(&mut self, index: usize) -> (K, V) {
        let entry = self.raw.take(index, |_, _, _| {});
        if self.raw.should_shrink() {
            let half = self.raw.capacity() / 2;
            self.resize(half, index);
        }
        entry
    }

    fn grow(&mut self, tracked: usize) -> usize {
        match self.raw.grow_target() {
            Ok(target) => self.resize(target, tracked),
            Err(err) => panic!("cannot grow table: {err}"),
        }
    }

    fn resize(&mut self, target: usize, tracked: usize) -> usize {
        match self.raw.rehash(target, tracked) {
            Ok(index) => index,
            Err(err) => panic!("cannot resize table to {target} slots: {err}"),
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key was
    /// present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.find(&key) {
            Slot::Occupied(index) => Some(mem::replace(&mut self.raw.values[index], value)),
            Slot::Vacant(index) => {
                self.insert_at(index, key, value);
                None
            }
        }
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        match self.raw.find(key) {
            Slot::Occupied(index) => Some((&self.raw.keys[index], &self.raw.values[index])),
            Slot::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.raw.find(key) {
            Slot::Occupied(index) => Some(&mut self.raw.values[index]),
            Slot::Vacant(_) => None,
        }
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key).is_present()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        match self.raw.find(key) {
            Slot::Occupied(index) => Some(self.remove_entry_at(index)),
            Slot::Vacant(_) => None,
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::HashTable;
    /// #
    /// let mut counts: HashTable<char, u32> = HashTable::new();
    /// for c in "hello".chars() {
    ///     *counts.entry(c).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&'l'), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        match self.raw.find(&key) {
            Slot::Occupied(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Slot::Vacant(index) => Entry::Vacant(VacantEntry {
                table: self,
                index,
                key,
            }),
        }
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Shrinks the table to the smallest size that holds its entries.
    ///
    /// Returns `false` if the smaller arrays could not be allocated.
    pub fn trim(&mut self) -> bool {
        self.trim_to(self.len())
    }

    /// Shrinks the table to the smallest size able to hold `expected`
    /// entries.
    ///
    /// Returns `true` if the table already is that small or was shrunk.
    /// Returns `false`, leaving the table unchanged, when its current entries
    /// would not fit or the smaller arrays could not be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64, ()> = HashTable::with_capacity(1000);
    /// table.insert(1, ());
    /// table.insert(2, ());
    ///
    /// assert!(table.trim_to(10));
    /// assert_eq!(table.capacity(), 16);
    /// assert!(!table.trim_to(1));
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn trim_to(&mut self, expected: usize) -> bool {
        if expected < self.len() {
            return false;
        }
        let Some(target) = self.raw.trim_target(expected) else {
            return true;
        };
        self.raw.rehash(target, 0).is_ok()
    }

    /// Removes all entries and shrinks the arrays to hold `expected` entries
    /// if that is smaller than the current size.
    pub fn clear_and_trim_to(&mut self, expected: usize) {
        self.raw.clear_and_trim(expected);
    }

    /// Returns an iterator over the entries.
    ///
    /// The sentinel entry comes first, then the probed region from the last
    /// slot down to slot 0. The order changes whenever the table resizes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw.keys, &self.raw.values, self.raw.has_sentinel(), self.len())
    }

    /// Returns an iterator over the entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let has_sentinel = self.raw.has_sentinel();
        let remaining = self.raw.len();
        IterMut::new(&self.raw.keys, &mut self.raw.values, has_sentinel, remaining)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes and yields every entry. Entries not consumed are dropped when
    /// the iterator is.
    pub fn drain(&mut self) -> Drain<'_, K, V, S> {
        let pos = self.raw.capacity();
        let sentinel = self.raw.has_sentinel();
        let remaining = self.raw.len();
        Drain {
            table: &mut self.raw,
            pos,
            sentinel,
            remaining,
        }
    }

    /// Returns a cursor that walks the table in [`HashTable::iter`] order and
    /// can remove the entry it is positioned on.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = (0..100).map(|k| (k, k * 2)).collect();
    /// let mut cursor = table.cursor_mut();
    /// while let Some((key, value)) = cursor.next_entry().unwrap() {
    ///     if *key % 3 == 0 {
    ///         cursor.remove_current().unwrap();
    ///     } else {
    ///         *value += 1;
    ///     }
    /// }
    /// assert_eq!(table.len(), 66);
    /// assert_eq!(table.get(&4), Some(&9));
    /// ```
    pub fn cursor_mut(&mut self) -> CursorMut<'_, K, V, S>
    where
        K: Clone,
    {
        let pos = self.raw.capacity();
        let sentinel_pending = self.raw.has_sentinel();
        let remaining = self.raw.len();
        CursorMut {
            table: &mut self.raw,
            phase: Phase::Scanning,
            pos,
            sentinel_pending,
            remaining,
            current: None,
            wrapped: Vec::new(),
        }
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// Fails with [`Error::ConcurrentModification`] if the strategy hashes
    /// keys inconsistently. Entries visited before the failure stay removed.
    pub fn try_retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) -> Result<(), Error>
    where
        K: Clone,
    {
        let mut cursor = self.cursor_mut();
        while let Some((key, value)) = cursor.next_entry()? {
            if !keep(key, value) {
                cursor.remove_current()?;
            }
        }
        Ok(())
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// # Panics
    ///
    /// Panics if the strategy hashes keys inconsistently.
    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool)
    where
        K: Clone,
    {
        if let Err(err) = self.try_retain(keep) {
            panic!("retain aborted: {err}");
        }
    }

    /// Returns a histogram of probe distances: entry `d` counts the entries
    /// stored `d` slots past their home bucket.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> Vec<usize> {
        self.raw.probe_histogram()
    }

    /// Returns statistics about the table layout.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::DebugStats {
        self.raw.debug_stats(0)
    }

    /// Prints a probe-distance histogram.
    #[cfg(all(feature = "stats", feature = "std"))]
    pub fn print_probe_histogram(&self) {
        let histogram = self.probe_histogram();
        let total: usize = histogram.iter().sum();
        println!("=== Probe Distance Histogram ===");
        for (distance, count) in histogram.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            let percent = *count as f64 * 100.0 / total.max(1) as f64;
            println!("{distance:4}: {count:8} ({percent:6.2}%)");
        }
    }
}

impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Key,
    V: Default + PartialEq,
    S: Strategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HashTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut table = Self::with_capacity(iter.size_hint().0);
        table.extend(iter);
        table
    }
}

impl<K, V, S> Table<K, V> for HashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    fn len(&self) -> usize {
        self.raw.len()
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, Error> {
        Ok(self.insert(key, value))
    }

    fn try_remove(&mut self, key: &K) -> Result<Option<V>, Error> {
        Ok(self.remove(key))
    }

    fn try_clear(&mut self) -> Result<(), Error> {
        self.clear();
        Ok(())
    }
}

/// A view into a single slot of a [`HashTable`].
pub enum Entry<'a, K, V, S> {
    /// The key is present.
    Occupied(OccupiedEntry<'a, K, V, S>),
    /// The key is absent.
    Vacant(VacantEntry<'a, K, V, S>),
}

impl<'a, K, V, S> Entry<'a, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }

    /// Inserts `default` if the entry is vacant, and returns the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant, and returns
    /// the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts `V::default()` if the entry is vacant, and returns the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the value if the entry is occupied.
    ///
    /// Returns the value when occupied, `None` otherwise.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(&mut *value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }
}

/// An occupied slot of a [`HashTable`].
pub struct OccupiedEntry<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    /// Returns the slot index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the stored key.
    pub fn key(&self) -> &K {
        &self.table.raw.keys[self.index]
    }

    /// Returns the stored value.
    pub fn get(&self) -> &V {
        &self.table.raw.values[self.index]
    }

    /// Returns the stored value mutably.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.raw.values[self.index]
    }

    /// Converts the entry into a mutable reference to its value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table.raw.values[self.index]
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }

    /// Removes the entry, returning its key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.table.remove_entry_at(self.index)
    }
}

/// A vacant slot of a [`HashTable`].
pub struct VacantEntry<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
    key: K,
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    /// Returns the slot index the key would be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Gives back the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the entry, returning a reference to the stored value.
    pub fn insert(self, value: V) -> &'a mut V {
        self.table.insert_at(self.index, self.key, value)
    }
}

type RegionIter<'a, K, V> = Rev<Zip<slice::Iter<'a, K>, slice::Iter<'a, V>>>;

/// Iterator over the entries of a [`HashTable`], in physical order.
pub struct Iter<'a, K, V> {
    sentinel: Option<(&'a K, &'a V)>,
    region: RegionIter<'a, K, V>,
    remaining: usize,
}

impl<'a, K: Key, V> Iter<'a, K, V> {
    fn new(keys: &'a [K], values: &'a [V], has_sentinel: bool, remaining: usize) -> Self {
        let n = keys.len() - 1;
        Self {
            sentinel: has_sentinel.then(|| (&keys[n], &values[n])),
            region: keys[..n].iter().zip(values[..n].iter()).rev(),
            remaining,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            sentinel: self.sentinel,
            region: self.region.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K: Key, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if let Some(entry) = self.sentinel.take() {
            return Some(entry);
        }
        self.region.find(|(key, _)| !key.is_zero())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: Key, V> FusedIterator for Iter<'_, K, V> {}

type RegionIterMut<'a, K, V> = Rev<Zip<slice::Iter<'a, K>, slice::IterMut<'a, V>>>;

/// Iterator over the entries of a [`HashTable`] with mutable values.
pub struct IterMut<'a, K, V> {
    sentinel: Option<(&'a K, &'a mut V)>,
    region: RegionIterMut<'a, K, V>,
    remaining: usize,
}

impl<'a, K: Key, V> IterMut<'a, K, V> {
    fn new(keys: &'a [K], values: &'a mut [V], has_sentinel: bool, remaining: usize) -> Self {
        let n = keys.len() - 1;
        let (region_values, sentinel_value) = values.split_at_mut(n);
        Self {
            sentinel: if has_sentinel {
                Some((&keys[n], &mut sentinel_value[0]))
            } else {
                None
            },
            region: keys[..n].iter().zip(region_values.iter_mut()).rev(),
            remaining,
        }
    }
}

impl<'a, K: Key, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if let Some(entry) = self.sentinel.take() {
            return Some(entry);
        }
        self.region.find(|(key, _)| !key.is_zero())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K: Key, V> FusedIterator for IterMut<'_, K, V> {}

/// Iterator over the keys of a [`HashTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Key, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Key, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over the values of a [`HashTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Key, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Key, V> ExactSizeIterator for Values<'_, K, V> {}

/// Iterator over mutable values of a [`HashTable`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K: Key, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Key, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Draining iterator over a [`HashTable`].
///
/// Entries are moved out without closing probe chains; the table is only
/// consistent again once the iterator is dropped.
pub struct Drain<'a, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    table: &'a mut RawTable<K, V, S>,
    pos: usize,
    sentinel: bool,
    remaining: usize,
}

impl<K, V, S> Iterator for Drain<'_, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let index = if self.sentinel {
            self.sentinel = false;
            self.table.capacity()
        } else {
            loop {
                self.pos -= 1;
                if !self.table.keys[self.pos].is_zero() {
                    break self.pos;
                }
            }
        };

        Some((
            mem::take(&mut self.table.keys[index]),
            mem::take(&mut self.table.values[index]),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Drain<'_, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
}

impl<K, V, S> Drop for Drain<'_, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    fn drop(&mut self) {
        self.table.clear();
    }
}

/// Owning iterator over a [`HashTable`], in physical order.
pub struct IntoIter<K, V> {
    sentinel: Option<(K, V)>,
    region: Rev<Zip<alloc::vec::IntoIter<K>, alloc::vec::IntoIter<V>>>,
    remaining: usize,
}

impl<K: Key, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if let Some(entry) = self.sentinel.take() {
            return Some(entry);
        }
        self.region.find(|(key, _)| !key.is_zero())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for HashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.raw.len();
        let has_sentinel = self.raw.has_sentinel();
        let (mut keys, mut values) = self.raw.into_arrays();
        let sentinel = match (keys.pop(), values.pop()) {
            (Some(key), Some(value)) if has_sentinel => Some((key, value)),
            _ => None,
        };
        IntoIter {
            sentinel,
            region: keys.into_iter().zip(values).rev(),
            remaining,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Walking the physical slots downward.
    Scanning,
    /// Looking up keys that removals shifted into already visited slots.
    /// Carries the index of the next buffered key.
    ResolvingBuffered(usize),
    Exhausted,
}

#[derive(Clone, Copy, Debug)]
enum Current {
    Slot(usize),
    Buffered { buffer_index: usize, slot: usize },
}

/// A cursor over a [`HashTable`] that can remove the entry it is positioned
/// on.
///
/// Removal shifts later entries of the same probe chain backward. An entry
/// that wraps from the start of the array into the already visited end would
/// be skipped, so the cursor remembers its key and visits it by lookup after
/// the scan finishes. Every entry present when the cursor was created and not
/// removed through it is visited exactly once.
pub struct CursorMut<'a, K, V, S> {
    table: &'a mut RawTable<K, V, S>,
    phase: Phase,
    pos: usize,
    sentinel_pending: bool,
    remaining: usize,
    current: Option<Current>,
    wrapped: Vec<Option<K>>,
}

impl<K, V, S> CursorMut<'_, K, V, S>
where
    K: Key + Clone,
    V: Default,
    S: Strategy<K>,
{
    /// Advances to the next entry and returns it.
    ///
    /// Fails with [`Error::ConcurrentModification`] if an entry the cursor
    /// still owes a visit can no longer be found.
    pub fn next_entry(&mut self) -> Result<Option<(&K, &mut V)>, Error> {
        match self.advance()? {
            Some(index) => Ok(Some((&self.table.keys[index], &mut self.table.values[index]))),
            None => Ok(None),
        }
    }

    fn advance(&mut self) -> Result<Option<usize>, Error> {
        self.current = None;

        loop {
            if self.remaining == 0 {
                self.phase = Phase::Exhausted;
            }

            match self.phase {
                Phase::Exhausted => return Ok(None),
                Phase::Scanning => {
                    if self.sentinel_pending {
                        self.sentinel_pending = false;
                        return Ok(Some(self.visit(Current::Slot(self.table.capacity()))));
                    }
                    if self.pos == 0 {
                        self.phase = Phase::ResolvingBuffered(0);
                        continue;
                    }
                    self.pos -= 1;
                    if !self.table.keys[self.pos].is_zero() {
                        return Ok(Some(self.visit(Current::Slot(self.pos))));
                    }
                }
                Phase::ResolvingBuffered(buffer_index) => {
                    let Some(pending) = self.wrapped.get(buffer_index) else {
                        return Err(Error::ConcurrentModification);
                    };
                    self.phase = Phase::ResolvingBuffered(buffer_index + 1);
                    let Some(key) = pending else {
                        continue;
                    };
                    match self.table.find(key) {
                        Slot::Occupied(slot) => {
                            return Ok(Some(self.visit(Current::Buffered {
                                buffer_index,
                                slot,
                            })));
                        }
                        Slot::Vacant(_) => return Err(Error::ConcurrentModification),
                    }
                }
            }
        }
    }

    fn visit(&mut self, current: Current) -> usize {
        self.remaining -= 1;
        self.current = Some(current);
        match current {
            Current::Slot(slot) | Current::Buffered { slot, .. } => slot,
        }
    }

    /// Removes the entry the cursor is positioned on.
    ///
    /// Fails with [`Error::NoCurrentEntry`] if the cursor has not been
    /// advanced onto an entry, or the current entry was already removed.
    pub fn remove_current(&mut self) -> Result<(K, V), Error> {
        match self.current.take().ok_or(Error::NoCurrentEntry)? {
            Current::Slot(slot) => {
                let wrapped = &mut self.wrapped;
                Ok(self.table.take(slot, |from, to, key| {
                    if from < to {
                        wrapped.push(Some(key.clone()));
                    }
                }))
            }
            Current::Buffered { buffer_index, slot } => {
                self.wrapped[buffer_index] = None;
                Ok(self.table.take(slot, |_, _, _| {}))
            }
        }
    }

    /// Returns the number of entries still to be visited.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}
