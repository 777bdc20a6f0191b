use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem;

use crate::config::Config;
use crate::error::Error;
use crate::frozen_table::FrozenTable;
use crate::links::Order;
use crate::raw::RawTable;
use crate::raw::Slot;
use crate::strategy::DefaultStrategy;
use crate::strategy::Key;
use crate::strategy::Strategy;
use crate::table::Table;

/// An open-addressing hash table that remembers the order of its entries.
///
/// `LinkedHashTable` is a [`HashTable`](crate::HashTable) with a doubly
/// linked list threaded through its slots. Iteration follows the list, which
/// by default is insertion order: [`insert`](Self::insert) appends new keys
/// and leaves existing keys where they are. The `move_to_*` family turns it
/// into an access-ordered table, for example to implement an LRU cache.
///
/// Order survives resizing: the table rehashes by walking the list, so the
/// relative order of entries is never disturbed by growth or shrinking.
///
/// ## Example
///
/// ```rust
/// use opal_hash::LinkedHashTable;
///
/// let mut table: LinkedHashTable<u32, &str> = LinkedHashTable::new();
/// table.insert(3, "c");
/// table.insert(1, "a");
/// table.insert(2, "b");
///
/// let keys: Vec<u32> = table.keys().copied().collect();
/// assert_eq!(keys, [3, 1, 2]);
///
/// table.remove(&3);
/// table.insert(3, "c");
/// assert_eq!(table.last_key(), Some(&3));
/// ```
#[derive(Clone)]
pub struct LinkedHashTable<K, V, S = DefaultStrategy> {
    raw: RawTable<K, V, S>,
    order: Order,
}

impl<K, V, S> Debug for LinkedHashTable<K, V, S>
where
    K: Key + Debug,
    V: Default + Debug,
    S: Strategy<K>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> LinkedHashTable<K, V, DefaultStrategy>
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
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_strategy(expected, DefaultStrategy)
    }
}

impl<K, V> Default for LinkedHashTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> LinkedHashTable<K, V, S>
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
    pub fn try_with_config(config: Config, strategy: S) -> Result<Self, Error> {
        let raw = RawTable::new(&config, strategy)?;
        let order = Order::with_slots(raw.capacity())?;
        Ok(Self { raw, order })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the number of slots in the probed region.
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

    /// Probes for `key`. See [`HashTable::find`](crate::HashTable::find).
    pub fn find(&self, key: &K) -> Slot {
        self.raw.find(key)
    }

    /// Writes a new entry at the tail of the order into the slot reported
    /// vacant by the preceding [`find`](Self::find) call, growing if needed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a vacant slot, or if the table cannot grow.
    pub fn insert_at(&mut self, index: usize, key: K, value: V) -> &mut V {
        self.raw.put(index, key, value);
        self.order.append(index);
        let index = self.grow_if_full(index);
        &mut self.raw.values[index]
    }

    /// Removes the entry in slot `index` and returns its value.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not hold an entry.
    pub fn remove_at(&mut self, index: usize) -> V {
        self.remove_entry_at(index).1
    }

    fn remove_entry_at(&mut self, index: usize) -> (K, V) {
        self.order.unlink(index);
        let order = &mut self.order;
        let entry = self.raw.take(index, |from, to, _| order.relink(from, to));
        if self.raw.should_shrink() {
            let half = self.raw.capacity() / 2;
            self.resize(half, index);
        }
        entry
    }

    fn grow_if_full(&mut self, tracked: usize) -> usize {
        if !self.raw.needs_grow() {
            return tracked;
        }
        match self.raw.grow_target() {
            Ok(target) => self.resize(target, tracked),
            Err(err) => panic!("cannot grow table: {err}"),
        }
    }

    fn resize(&mut self, target: usize, tracked: usize) -> usize {
        match self.rehash(target, tracked) {
            Ok(index) => index,
            Err(err) => panic!("cannot resize table to {target} slots: {err}"),
        }
    }

    /// Rehashes into `new_n` slots, re-inserting entries in list order so the
    /// rebuilt list keeps the same sequence. Returns where the entry at
    /// `tracked` ended up. On error the table is unchanged.
    fn rehash(&mut self, new_n: usize, tracked: usize) -> Result<usize, Error> {
        let raw = &self.raw;
        let sequence = self.order.walk(raw.len(), |slot| raw.is_live(slot))?;
        let mut order = Order::with_slots(new_n)?;

        let mut moved_to = tracked;
        self.raw.relocate(new_n, sequence, |from, to| {
            order.append(to);
            if from == tracked {
                moved_to = to;
            }
        })?;
        self.order = order;
        Ok(moved_to)
    }

    /// Inserts a key-value pair. A new key goes to the end of the order; an
    /// existing key keeps its position and has its value replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.find(&key) {
            Slot::Occupied(index) => Some(mem::replace(&mut self.raw.values[index], value)),
            Slot::Vacant(index) => {
                self.insert_at(index, key, value);
                None
            }
        }
    }

    /// Inserts a key-value pair and makes it the first entry, whether or not
    /// the key was already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::LinkedHashTable;
    /// #
    /// let mut table: LinkedHashTable<u8, u8> = (1..=3).map(|k| (k, k)).collect();
    /// assert_eq!(table.insert_and_move_to_first(3, 30), Some(3));
    /// assert_eq!(table.insert_and_move_to_first(4, 40), None);
    /// assert_eq!(table.keys().copied().collect::<Vec<_>>(), [4, 3, 1, 2]);
    /// ```
    pub fn insert_and_move_to_first(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.find(&key) {
            Slot::Occupied(index) => {
                self.order.move_to_first(index);
                Some(mem::replace(&mut self.raw.values[index], value))
            }
            Slot::Vacant(index) => {
                self.raw.put(index, key, value);
                self.order.prepend(index);
                self.grow_if_full(index);
                None
            }
        }
    }

    /// Inserts a key-value pair and makes it the last entry, whether or not
    /// the key was already present.
    pub fn insert_and_move_to_last(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.find(&key) {
            Slot::Occupied(index) => {
                self.order.move_to_last(index);
                Some(mem::replace(&mut self.raw.values[index], value))
            }
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

    /// Returns a mutable reference to the value stored for `key`. Does not
    /// change the order.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.raw.find(key) {
            Slot::Occupied(index) => Some(&mut self.raw.values[index]),
            Slot::Vacant(_) => None,
        }
    }

    /// Returns the value for `key` and makes its entry the first one.
    pub fn get_and_move_to_first(&mut self, key: &K) -> Option<&mut V> {
        match self.raw.find(key) {
            Slot::Occupied(index) => {
                self.order.move_to_first(index);
                Some(&mut self.raw.values[index])
            }
            Slot::Vacant(_) => None,
        }
    }

    /// Returns the value for `key` and makes its entry the last one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::LinkedHashTable;
    /// #
    /// // Least recently used entry first.
    /// let mut cache: LinkedHashTable<u32, u32> = (1..=3).map(|k| (k, k * 10)).collect();
    /// assert_eq!(cache.get_and_move_to_last(&1), Some(&mut 10));
    /// assert_eq!(cache.pop_first(), Some((2, 20)));
    /// ```
    pub fn get_and_move_to_last(&mut self, key: &K) -> Option<&mut V> {
        match self.raw.find(key) {
            Slot::Occupied(index) => {
                self.order.move_to_last(index);
                Some(&mut self.raw.values[index])
            }
            Slot::Vacant(_) => None,
        }
    }

    /// Makes the entry for `key` the first one. Returns `false` if the key is
    /// absent.
    pub fn move_to_first(&mut self, key: &K) -> bool {
        self.get_and_move_to_first(key).is_some()
    }

    /// Makes the entry for `key` the last one. Returns `false` if the key is
    /// absent.
    pub fn move_to_last(&mut self, key: &K) -> bool {
        self.get_and_move_to_last(key).is_some()
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

    /// Returns the first entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.order
            .first()
            .map(|slot| (&self.raw.keys[slot], &self.raw.values[slot]))
    }

    /// Returns the last entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.order
            .last()
            .map(|slot| (&self.raw.keys[slot], &self.raw.values[slot]))
    }

    /// Returns the first key.
    pub fn first_key(&self) -> Option<&K> {
        self.first().map(|(key, _)| key)
    }

    /// Returns the last key.
    pub fn last_key(&self) -> Option<&K> {
        self.last().map(|(key, _)| key)
    }

    /// Removes and returns the first entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let slot = self.order.first()?;
        Some(self.remove_entry_at(slot))
    }

    /// Removes and returns the last entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let slot = self.order.last()?;
        Some(self.remove_entry_at(slot))
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.order.clear();
    }

    /// Shrinks the table to the smallest size that holds its entries.
    pub fn trim(&mut self) -> bool {
        self.trim_to(self.len())
    }

    /// Shrinks the table to the smallest size able to hold `expected`
    /// entries, keeping the order. Returns `false`, leaving the table
    /// unchanged, when the current entries would not fit or allocation
    /// fails.
    pub fn trim_to(&mut self, expected: usize) -> bool {
        if expected < self.len() {
            return false;
        }
        let Some(target) = self.raw.trim_target(expected) else {
            return true;
        };
        self.rehash(target, 0).is_ok()
    }

    /// Removes all entries and shrinks the arrays to hold `expected` entries
    /// if that is smaller than the current size.
    pub fn clear_and_trim_to(&mut self, expected: usize) {
        self.clear();
        let Some(order) = self
            .raw
            .trim_target(expected)
            .and_then(|target| Order::with_slots(target).ok())
        else {
            return;
        };
        if self.raw.clear_and_trim(expected).is_some() {
            self.order = order;
        }
    }

    /// Returns an iterator over the entries in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw.keys, &self.raw.values, &self.order, self.raw.len())
    }

    /// Returns an iterator over the entries in order, starting at `key`.
    /// The iterator is empty if `key` is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use opal_hash::LinkedHashTable;
    /// #
    /// let table: LinkedHashTable<char, u8> = "opal".chars().zip(0..).collect();
    /// let tail: String = table.iter_from(&'a').map(|(k, _)| *k).collect();
    /// assert_eq!(tail, "al");
    /// ```
    pub fn iter_from(&self, key: &K) -> Iter<'_, K, V> {
        Iter::starting_at(
            &self.raw.keys,
            &self.raw.values,
            &self.order,
            self.raw.find(key),
            self.raw.len(),
        )
    }

    /// Returns an iterator over the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns a cursor that walks the entries in order and can remove the
    /// entry it is positioned on.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, K, V, S> {
        let next = self.order.first();
        let budget = self.raw.len();
        CursorMut {
            table: self,
            current: None,
            next,
            budget,
        }
    }

    /// Keeps only the entries for which `keep` returns `true`, preserving
    /// the order of the rest.
    pub fn try_retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) -> Result<(), Error> {
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
    /// Panics if the order list is found to be inconsistent.
    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
        if let Err(err) = self.try_retain(keep) {
            panic!("retain aborted: {err}");
        }
    }

    /// Converts the table into an immutable [`FrozenTable`] with the same
    /// entries and order, without rehashing.
    pub fn freeze(self) -> FrozenTable<K, V, S> {
        FrozenTable::from_parts(self.raw, self.order)
    }

    /// Returns a histogram of probe distances.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> Vec<usize> {
        self.raw.probe_histogram()
    }

    /// Returns statistics about the table layout, including the link array.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::DebugStats {
        self.raw.debug_stats(self.order.bytes())
    }
}

impl<K, V, S> PartialEq for LinkedHashTable<K, V, S>
where
    K: Key,
    V: Default + PartialEq,
    S: Strategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Extend<(K, V)> for LinkedHashTable<K, V, S>
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

impl<K, V> FromIterator<(K, V)> for LinkedHashTable<K, V, DefaultStrategy>
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

impl<K, V, S> Table<K, V> for LinkedHashTable<K, V, S>
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

/// Iterator over the entries of an ordered table, following the link order.
pub struct Iter<'a, K, V> {
    keys: &'a [K],
    values: &'a [V],
    order: &'a Order,
    front: Option<usize>,
    back: Option<usize>,
    lower: usize,
    upper: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(keys: &'a [K], values: &'a [V], order: &'a Order, len: usize) -> Self {
        Self {
            keys,
            values,
            order,
            front: order.first(),
            back: order.last(),
            lower: len,
            upper: len,
        }
    }

    /// Iterates from `slot` to the end of the list. `len` bounds the number
    /// of entries that can follow.
    pub(crate) fn starting_at(
        keys: &'a [K],
        values: &'a [V],
        order: &'a Order,
        slot: Slot,
        len: usize,
    ) -> Self {
        let (front, back, lower, upper) = match slot {
            Slot::Occupied(slot) => (Some(slot), order.last(), 1, len),
            Slot::Vacant(_) => (None, None, 0, 0),
        };
        Self {
            keys,
            values,
            order,
            front,
            back,
            lower,
            upper,
        }
    }

    fn finish_step(&mut self) {
        self.lower = self.lower.saturating_sub(1);
        self.upper = self.upper.saturating_sub(1);
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys,
            values: self.values,
            order: self.order,
            front: self.front,
            back: self.back,
            lower: self.lower,
            upper: self.upper,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.order.next(slot);
        }
        self.finish_step();
        Some((&self.keys[slot], &self.values[slot]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.front.is_none() {
            (0, Some(0))
        } else {
            (self.lower.max(1), Some(self.upper))
        }
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.order.prev(slot);
        }
        self.finish_step();
        Some((&self.keys[slot], &self.values[slot]))
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over the keys of an ordered table.
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

/// Iterator over the values of an ordered table.
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

/// Owning iterator over an ordered table, in link order.
pub struct IntoIter<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    order: Order,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<K: Default, V: Default> IntoIter<K, V> {
    pub(crate) fn new(keys: Vec<K>, values: Vec<V>, order: Order, remaining: usize) -> Self {
        Self {
            front: order.first(),
            back: order.last(),
            keys,
            values,
            order,
            remaining,
        }
    }

    fn take(&mut self, slot: usize) -> (K, V) {
        self.remaining -= 1;
        (
            mem::take(&mut self.keys[slot]),
            mem::take(&mut self.values[slot]),
        )
    }
}

impl<K: Default, V: Default> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.order.next(slot);
        }
        Some(self.take(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Default, V: Default> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.order.prev(slot);
        }
        Some(self.take(slot))
    }
}

impl<K: Default, V: Default> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for LinkedHashTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.raw.len();
        let (keys, values) = self.raw.into_arrays();
        IntoIter::new(keys, values, self.order, remaining)
    }
}

impl<'a, K, V, S> IntoIterator for &'a LinkedHashTable<K, V, S>
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

/// A cursor over a [`LinkedHashTable`] in link order that can remove the
/// entry it is positioned on.
///
/// Removal may shift later entries of the probe chain into other slots; the
/// cursor follows its successor through those moves, so neither order nor
/// coverage is affected.
pub struct CursorMut<'a, K, V, S> {
    table: &'a mut LinkedHashTable<K, V, S>,
    current: Option<usize>,
    next: Option<usize>,
    budget: usize,
}

impl<K, V, S> CursorMut<'_, K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    /// Advances to the next entry and returns it.
    ///
    /// Fails with [`Error::ConcurrentModification`] if the order list leads
    /// to an empty slot or visits more entries than the table holds.
    pub fn next_entry(&mut self) -> Result<Option<(&K, &mut V)>, Error> {
        self.current = None;
        let Some(slot) = self.next else {
            return Ok(None);
        };
        if self.budget == 0 || !self.table.raw.is_live(slot) {
            return Err(Error::ConcurrentModification);
        }

        self.budget -= 1;
        self.next = self.table.order.next(slot);
        self.current = Some(slot);
        Ok(Some((&self.table.raw.keys[slot], &mut self.table.raw.values[slot])))
    }

    /// Removes the entry the cursor is positioned on.
    ///
    /// Fails with [`Error::NoCurrentEntry`] if the cursor is not on an
    /// entry.
    pub fn remove_current(&mut self) -> Result<(K, V), Error> {
        let slot = self.current.take().ok_or(Error::NoCurrentEntry)?;
        let table = &mut *self.table;
        table.order.unlink(slot);

        let order = &mut table.order;
        let next = &mut self.next;
        Ok(table.raw.take(slot, |from, to, _| {
            order.relink(from, to);
            if *next == Some(from) {
                *next = Some(to);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::strategy::FnStrategy;

    fn low_bits(key: &u64) -> u64 {
        key & 7
    }

    fn same(a: &u64, b: &u64) -> bool {
        a == b
    }

    /// Strategy collapsing keys onto eight hash values.
    fn clustered() -> FnStrategy<fn(&u64) -> u64, fn(&u64, &u64) -> bool> {
        FnStrategy::new(low_bits as fn(&u64) -> u64, same as fn(&u64, &u64) -> bool)
    }

    fn keys<K: Key + Copy, V: Default, S: Strategy<K>>(table: &LinkedHashTable<K, V, S>) -> Vec<K> {
        table.keys().copied().collect()
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut table: LinkedHashTable<i32, i32> = LinkedHashTable::new();
        for k in [5, -3, 0, 12, 7] {
            table.insert(k, k);
        }
        assert_eq!(keys(&table), vec![5, -3, 0, 12, 7]);

        table.insert(-3, 99);
        assert_eq!(keys(&table), vec![5, -3, 0, 12, 7]);
        assert_eq!(table.get(&-3), Some(&99));

        table.remove(&-3);
        table.insert(-3, 1);
        assert_eq!(keys(&table), vec![5, 0, 12, 7, -3]);
    }

    #[test]
    fn order_survives_growth_and_shrinking() {
        let mut table: LinkedHashTable<u64, u64> = LinkedHashTable::with_capacity(2);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut model = Vec::new();
        while model.len() < 2000 {
            let key = rng.random::<u64>() >> 1;
            if table.insert(key, key).is_none() {
                model.push(key);
            }
        }
        assert_eq!(keys(&table), model);

        let grown = table.capacity();
        let survivors = model.split_off(1990);
        for key in &model {
            assert_eq!(table.remove(key), Some(*key));
        }
        assert!(table.capacity() < grown);
        assert_eq!(keys(&table), survivors);
    }

    #[test]
    fn removal_under_collisions_keeps_order() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut table = LinkedHashTable::<u64, u64, _>::with_strategy(clustered());
        let mut model: Vec<u64> = Vec::new();
        for step in 0..3000u64 {
            let key = rng.random_range(0..150u64);
            if rng.random_bool(0.55) {
                if table.insert(key, step).is_none() {
                    model.push(key);
                }
            } else if table.remove(&key).is_some() {
                model.retain(|k| *k != key);
            }
            assert_eq!(table.len(), model.len());
        }
        assert_eq!(keys(&table), model);
        let backwards: Vec<u64> = table.keys().rev().copied().collect();
        assert_eq!(backwards, model.iter().rev().copied().collect::<Vec<_>>());
    }

    #[test]
    fn access_order_operations() {
        let mut table: LinkedHashTable<u8, u8> = (1..=5).map(|k| (k, k)).collect();
        assert!(table.move_to_first(&4));
        assert!(table.move_to_last(&1));
        assert!(!table.move_to_last(&9));
        assert_eq!(keys(&table), vec![4, 2, 3, 5, 1]);

        *table.get_and_move_to_first(&5).unwrap() = 50;
        assert_eq!(table.first(), Some((&5, &50)));
        assert_eq!(table.insert_and_move_to_last(4, 40), Some(4));
        assert_eq!(table.insert_and_move_to_last(0, 0), None);
        assert_eq!(table.insert_and_move_to_first(7, 7), None);
        assert_eq!(keys(&table), vec![7, 5, 2, 3, 1, 4, 0]);
        assert_eq!(table.last_key(), Some(&0));
        assert_eq!(table.first_key(), Some(&7));
    }

    #[test]
    fn pop_from_both_ends() {
        let mut table: LinkedHashTable<u32, u32> = (0..4).map(|k| (k, k * 2)).collect();
        assert_eq!(table.pop_first(), Some((0, 0)));
        assert_eq!(table.pop_last(), Some((3, 6)));
        assert_eq!(table.pop_first(), Some((1, 2)));
        assert_eq!(table.pop_last(), Some((2, 4)));
        assert_eq!(table.pop_first(), None);
        assert!(table.is_empty());
        assert_eq!(table.first(), None);
    }

    #[test]
    fn double_ended_iteration_meets_in_the_middle() {
        let table: LinkedHashTable<u32, ()> = (1..=5).map(|k| (k, ())).collect();
        let mut iter = table.keys();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
        assert_eq!(table.iter().size_hint(), (5, Some(5)));
    }

    #[test]
    fn iter_from_starts_at_key() {
        let table: LinkedHashTable<u32, u32> = (10..20).map(|k| (k, k)).collect();
        let tail: Vec<u32> = table.iter_from(&17).map(|(k, _)| *k).collect();
        assert_eq!(tail, vec![17, 18, 19]);
        assert_eq!(table.iter_from(&99).next(), None);
        assert_eq!(table.iter_from(&19).count(), 1);
    }

    #[test]
    fn cursor_retain_keeps_order() {
        let mut table = LinkedHashTable::<u64, u64, _>::with_strategy(clustered());
        for k in (0..200u64).rev() {
            table.insert(k, k);
        }
        table.retain(|k, v| {
            *v += 1;
            k % 3 != 0
        });
        let expected: Vec<u64> = (0..200u64).rev().filter(|k| k % 3 != 0).collect();
        assert_eq!(keys(&table), expected);
        assert!(table.iter().all(|(k, v)| *v == k + 1));
    }

    #[test]
    fn cursor_reports_misuse() {
        let mut table: LinkedHashTable<u8, u8> = (1..=2).map(|k| (k, k)).collect();
        let mut cursor = table.cursor_mut();
        assert_eq!(cursor.remove_current(), Err(Error::NoCurrentEntry));
        assert_eq!(cursor.next_entry().unwrap().map(|(k, _)| *k), Some(1));
        assert_eq!(cursor.remove_current(), Ok((1, 1)));
        assert_eq!(cursor.next_entry().unwrap().map(|(k, _)| *k), Some(2));
        assert_eq!(cursor.next_entry().unwrap(), None);
    }

    #[test]
    fn sentinel_key_takes_part_in_order() {
        let mut table: LinkedHashTable<f32, u8> = LinkedHashTable::new();
        table.insert(1.0, 1);
        table.insert(0.0, 0);
        table.insert(-0.0, 2);
        assert_eq!(keys(&table).iter().map(|k| k.to_bits()).collect::<Vec<_>>(), vec![
            1.0f32.to_bits(),
            0.0f32.to_bits(),
            (-0.0f32).to_bits()
        ]);
        assert_eq!(table.pop_first(), Some((1.0, 1)));
        assert_eq!(table.first().map(|(_, v)| *v), Some(0));
    }

    #[test]
    fn trim_and_clear_keep_order() {
        let mut table: LinkedHashTable<u32, u32> = LinkedHashTable::with_capacity(500);
        for k in (0..20).rev() {
            table.insert(k, k);
        }
        let before = table.capacity();
        assert!(table.trim());
        assert!(table.capacity() < before);
        assert_eq!(keys(&table), (0..20).rev().collect::<Vec<_>>());
        assert!(!table.trim_to(1));

        table.clear_and_trim_to(2);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 4);
        table.insert(9, 9);
        table.insert(8, 8);
        assert_eq!(keys(&table), vec![9, 8]);

        table.clear();
        assert_eq!(table.first(), None);
        assert_eq!(table.iter().next(), None);
    }

    #[test]
    fn trim_succeeds_at_fill_limits() {
        let mut table: LinkedHashTable<u64, u64> = LinkedHashTable::with_capacity(4096);
        for k in [3, 1, 2] {
            table.insert(k, k);
        }
        assert!(table.trim());
        assert_eq!(table.capacity(), 8);
        assert_eq!(keys(&table), vec![3, 1, 2]);

        for k in 4..=12 {
            table.insert(k, k);
        }
        let mut wide: LinkedHashTable<u64, u64> = LinkedHashTable::with_capacity(4096);
        wide.extend(table.iter().map(|(k, v)| (*k, *v)));
        assert!(wide.trim());
        assert_eq!(wide.capacity(), 32);
        assert_eq!(keys(&wide), keys(&table));
    }

    #[test]
    fn cursor_rejects_links_to_empty_slots() {
        let mut table: LinkedHashTable<u64, u64> = (1..=3).map(|k| (k, k * 10)).collect();
        let Slot::Vacant(dead) = table.raw.find(&99) else {
            panic!("99 was never inserted");
        };

        let mut cursor = table.cursor_mut();
        assert_eq!(cursor.next_entry().unwrap().map(|(k, _)| *k), Some(1));
        cursor.next = Some(dead);
        assert_eq!(
            cursor.next_entry().map(|entry| entry.is_some()),
            Err(Error::ConcurrentModification)
        );
    }

    #[test]
    fn cursor_rejects_orders_longer_than_the_table() {
        let mut table: LinkedHashTable<u64, u64> = (1..=3).map(|k| (k, k)).collect();
        let mut cursor = table.cursor_mut();
        cursor.budget = 2;
        assert!(cursor.next_entry().unwrap().is_some());
        assert!(cursor.next_entry().unwrap().is_some());
        assert_eq!(
            cursor.next_entry().map(|entry| entry.is_some()),
            Err(Error::ConcurrentModification)
        );
    }

    #[test]
    fn into_iter_follows_order() {
        let table: LinkedHashTable<u32, u32> = [(3, 30), (1, 10), (2, 20)].into_iter().collect();
        let forward: Vec<_> = table.clone().into_iter().collect();
        assert_eq!(forward, vec![(3, 30), (1, 10), (2, 20)]);
        let backward: Vec<_> = table.into_iter().rev().collect();
        assert_eq!(backward, vec![(2, 20), (1, 10), (3, 30)]);
    }

    #[test]
    fn insert_at_tracks_growth() {
        let mut table: LinkedHashTable<u32, u32> = LinkedHashTable::with_capacity(1);
        for k in 1..50 {
            let index = table.find(&k).index();
            *table.insert_at(index, k, 0) = k;
        }
        assert_eq!(keys(&table), (1..50).collect::<Vec<_>>());
        assert!(table.iter().all(|(k, v)| k == v));
    }

    #[cfg(feature = "stats")]
    #[test]
    fn stats_count_links() {
        let table: LinkedHashTable<u32, u32> = (0..10).map(|k| (k, k)).collect();
        let stats = table.debug_stats();
        let slots = table.capacity() + 1;
        assert_eq!(stats.total_bytes, slots * 8 + slots * 8);
    }
}
