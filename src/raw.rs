//! The open-addressing engine shared by every table type.
//!
//! Keys and values live in two parallel arrays of `n + 1` slots, where `n` is
//! a power of two. Slots `0..n` form the linearly probed region; slot `n` is
//! reserved for the sentinel key (the key type's zero value), which would
//! otherwise be indistinguishable from an empty slot. There are no
//! tombstones: removal closes the probe chain by shifting later entries
//! backward.

use alloc::vec::Vec;
use core::mem;

use crate::config::Config;
use crate::config::MIN_SHRINK_SLOTS;
use crate::config::max_fill;
use crate::config::table_size;
use crate::error::Error;
use crate::strategy::Key;
use crate::strategy::Strategy;
use crate::strategy::mix;

/// Outcome of probing a table for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The key is present at this index.
    Occupied(usize),
    /// The key is absent; this is the index it would be inserted at.
    Vacant(usize),
}

impl Slot {
    /// Returns `true` for [`Slot::Occupied`].
    #[inline]
    pub fn is_present(self) -> bool {
        matches!(self, Slot::Occupied(_))
    }

    /// Returns the index carried by either variant.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::Occupied(index) | Slot::Vacant(index) => index,
        }
    }

    /// Packs the slot into a single integer: the index itself when present,
    /// `-(insertion_point) - 1` when absent.
    #[inline]
    pub fn encoded(self) -> isize {
        match self {
            Slot::Occupied(index) => index as isize,
            Slot::Vacant(index) => -(index as isize) - 1,
        }
    }
}

fn allocate<K: Default, V: Default>(n: usize) -> Result<(Vec<K>, Vec<V>), Error> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    keys.try_reserve_exact(n + 1)
        .map_err(|_| Error::OutOfMemory { capacity: n })?;
    values
        .try_reserve_exact(n + 1)
        .map_err(|_| Error::OutOfMemory { capacity: n })?;
    keys.resize_with(n + 1, K::default);
    values.resize_with(n + 1, V::default);
    Ok((keys, values))
}

#[derive(Clone)]
pub(crate) struct RawTable<K, V, S> {
    pub(crate) keys: Vec<K>,
    pub(crate) values: Vec<V>,
    has_sentinel: bool,
    n: usize,
    mask: usize,
    max_fill: usize,
    size: usize,
    min_n: usize,
    load_factor: f32,
    shrink_divisor: usize,
    strategy: S,
}

impl<K, V, S> RawTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    pub(crate) fn new(config: &Config, strategy: S) -> Result<Self, Error> {
        let n = config.validate()?;
        let (keys, values) = allocate(n)?;

        Ok(Self {
            keys,
            values,
            has_sentinel: false,
            n,
            mask: n - 1,
            max_fill: max_fill(n, config.load_factor),
            size: 0,
            min_n: n,
            load_factor: config.load_factor,
            shrink_divisor: config.shrink_divisor,
            strategy,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.n
    }

    #[inline]
    pub(crate) fn max_fill(&self) -> usize {
        self.max_fill
    }

    #[inline]
    pub(crate) fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[inline]
    pub(crate) fn strategy(&self) -> &S {
        &self.strategy
    }

    #[inline]
    pub(crate) fn has_sentinel(&self) -> bool {
        self.has_sentinel
    }

    #[inline]
    pub(crate) fn is_live(&self, index: usize) -> bool {
        if index == self.n {
            self.has_sentinel
        } else {
            index < self.n && !self.keys[index].is_zero()
        }
    }

    #[inline(always)]
    fn home(&self, key: &K) -> usize {
        mix(self.strategy.hash(key)) as usize & self.mask
    }

    #[inline]
    fn is_sentinel_key(&self, key: &K) -> bool {
        self.strategy.equals(key, &K::default())
    }

    /// Probes for `key`.
    pub(crate) fn find(&self, key: &K) -> Slot {
        if self.is_sentinel_key(key) {
            return if self.has_sentinel {
                Slot::Occupied(self.n)
            } else {
                Slot::Vacant(self.n)
            };
        }

        let mut pos = self.home(key);
        loop {
            let current = &self.keys[pos];
            if current.is_zero() {
                return Slot::Vacant(pos);
            }
            if self.strategy.equals(key, current) {
                return Slot::Occupied(pos);
            }
            pos = (pos + 1) & self.mask;
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        match self.find(key) {
            Slot::Occupied(index) => Some(&self.values[index]),
            Slot::Vacant(_) => None,
        }
    }

    /// Writes an entry into a slot previously reported vacant by
    /// [`RawTable::find`]. Does not grow; callers check
    /// [`RawTable::needs_grow`] once they have done their own bookkeeping.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a vacant slot of this table.
    pub(crate) fn put(&mut self, index: usize, key: K, value: V) {
        if index == self.n {
            assert!(!self.has_sentinel, "sentinel slot is already occupied");
            self.has_sentinel = true;
        } else {
            assert!(
                index < self.n && self.keys[index].is_zero(),
                "slot {index} is not vacant"
            );
        }

        self.keys[index] = key;
        self.values[index] = value;
        self.size += 1;
    }

    /// Removes the live entry at `index`, closing the probe chain behind it.
    ///
    /// `on_move(from, to, key)` is invoked for every entry the backward shift
    /// relocates, after it has been written to `to`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a live slot of this table.
    pub(crate) fn take(
        &mut self,
        index: usize,
        on_move: impl FnMut(usize, usize, &K),
    ) -> (K, V) {
        assert!(self.is_live(index), "slot {index} is not occupied");
        self.size -= 1;

        let key = mem::take(&mut self.keys[index]);
        let value = mem::take(&mut self.values[index]);
        if index == self.n {
            self.has_sentinel = false;
        } else {
            self.shift_keys(index, on_move);
        }

        (key, value)
    }

    /// Backward-shift deletion starting from the gap at `pos`.
    ///
    /// Walks forward from the gap. An entry whose home bucket lies cyclically
    /// in `(last, pos]` must stay where it is, since moving it to `last` would
    /// place it before its home. Any other entry slides into the gap, which
    /// then moves to where that entry was. The walk stops at the first empty
    /// slot.
    fn shift_keys(&mut self, mut pos: usize, mut on_move: impl FnMut(usize, usize, &K)) {
        loop {
            let last = pos;
            pos = (pos + 1) & self.mask;

            loop {
                if self.keys[pos].is_zero() {
                    self.keys[last] = K::default();
                    self.values[last] = V::default();
                    return;
                }

                let slot = self.home(&self.keys[pos]);
                let movable = if last <= pos {
                    last >= slot || slot > pos
                } else {
                    last >= slot && slot > pos
                };
                if movable {
                    break;
                }
                pos = (pos + 1) & self.mask;
            }

            self.keys.swap(last, pos);
            self.values.swap(last, pos);
            on_move(pos, last, &self.keys[last]);
        }
    }

    #[inline]
    pub(crate) fn needs_grow(&self) -> bool {
        self.size >= self.max_fill
    }

    /// Number of slots the table grows to once it reaches its fill limit.
    pub(crate) fn grow_target(&self) -> Result<usize, Error> {
        table_size(self.size + 1, self.load_factor)
    }

    pub(crate) fn should_shrink(&self) -> bool {
        self.shrink_divisor != 0
            && self.n > self.min_n
            && self.n > MIN_SHRINK_SLOTS
            && self.size < self.max_fill / self.shrink_divisor
    }

    /// Number of slots `trim_to(expected)` would shrink to, or `None` when
    /// the table would have to keep its current size.
    ///
    /// The target always leaves room for one more entry than the table
    /// holds, so a trimmed table never sits exactly at its fill limit.
    pub(crate) fn trim_target(&self, expected: usize) -> Option<usize> {
        table_size(expected.max(self.size + 1), self.load_factor)
            .ok()
            .filter(|&l| l < self.n)
    }

    /// Counts live slots, for comparison against `size`.
    fn count_live(&self) -> usize {
        self.keys[..self.n].iter().filter(|k| !k.is_zero()).count() + self.has_sentinel as usize
    }

    /// Rehashes into `new_n` slots in physical order. Returns where the entry
    /// at `tracked` ended up.
    pub(crate) fn rehash(&mut self, new_n: usize, tracked: usize) -> Result<usize, Error> {
        if self.count_live() != self.size {
            return Err(Error::ConcurrentModification);
        }

        let mut moved_to = tracked;
        let order = (0..=self.n).rev();
        self.relocate(new_n, order, |from, to| {
            if from == tracked {
                moved_to = to;
            }
        })?;
        Ok(moved_to)
    }

    /// Moves every live entry named by `order` into freshly allocated arrays
    /// of `new_n` slots, re-probing each key. Indices that are not live are
    /// skipped; callers are responsible for naming each live slot exactly
    /// once. `on_place(from, to)` reports every relocation in `order` order.
    ///
    /// Allocation happens before anything is moved, so on error the table is
    /// untouched.
    pub(crate) fn relocate(
        &mut self,
        new_n: usize,
        order: impl IntoIterator<Item = usize>,
        mut on_place: impl FnMut(usize, usize),
    ) -> Result<(), Error> {
        debug_assert!(new_n.is_power_of_two());
        let (mut keys, mut values) = allocate::<K, V>(new_n)?;
        let mask = new_n - 1;

        for from in order {
            if !self.is_live(from) {
                continue;
            }

            let key = mem::take(&mut self.keys[from]);
            let value = mem::take(&mut self.values[from]);
            let to = if from == self.n {
                new_n
            } else {
                let mut pos = mix(self.strategy.hash(&key)) as usize & mask;
                while !keys[pos].is_zero() {
                    pos = (pos + 1) & mask;
                }
                pos
            };

            keys[to] = key;
            values[to] = value;
            on_place(from, to);
        }

        self.keys = keys;
        self.values = values;
        self.n = new_n;
        self.mask = mask;
        self.max_fill = max_fill(new_n, self.load_factor);
        Ok(())
    }

    pub(crate) fn into_arrays(self) -> (Vec<K>, Vec<V>) {
        (self.keys, self.values)
    }

    pub(crate) fn clear(&mut self) {
        if self.size == 0 {
            return;
        }

        self.size = 0;
        self.has_sentinel = false;
        self.keys.fill_with(K::default);
        self.values.fill_with(V::default);
    }

    /// Empties the table and, when `expected` asks for fewer slots, replaces
    /// the arrays with smaller ones. Returns the new slot count if it
    /// changed.
    pub(crate) fn clear_and_trim(&mut self, expected: usize) -> Option<usize> {
        self.clear();

        let l = self.trim_target(expected)?;
        let (keys, values) = allocate::<K, V>(l).ok()?;
        self.keys = keys;
        self.values = values;
        self.n = l;
        self.mask = l - 1;
        self.max_fill = max_fill(l, self.load_factor);
        Some(l)
    }

    /// Distance of the entry at `index` from its home bucket.
    #[cfg(feature = "stats")]
    fn probe_distance(&self, index: usize) -> usize {
        index.wrapping_sub(self.home(&self.keys[index])) & self.mask
    }

    #[cfg(feature = "stats")]
    pub(crate) fn probe_histogram(&self) -> Vec<usize> {
        let mut histogram = Vec::new();
        for index in 0..self.n {
            if self.keys[index].is_zero() {
                continue;
            }
            let distance = self.probe_distance(index);
            if histogram.len() <= distance {
                histogram.resize(distance + 1, 0);
            }
            histogram[distance] += 1;
        }
        histogram
    }

    #[cfg(feature = "stats")]
    pub(crate) fn debug_stats(&self, link_bytes: usize) -> DebugStats {
        let histogram = self.probe_histogram();
        let probed: usize = histogram.iter().sum();
        let total_distance: usize = histogram
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();

        DebugStats {
            populated: self.size,
            capacity: self.n,
            max_fill: self.max_fill,
            load_factor: self.size as f64 / self.n as f64,
            has_sentinel_entry: self.has_sentinel,
            longest_probe: histogram.len().saturating_sub(1),
            mean_probe: if probed == 0 {
                0.0
            } else {
                total_distance as f64 / probed as f64
            },
            total_bytes: (self.n + 1) * (mem::size_of::<K>() + mem::size_of::<V>()) + link_bytes,
        }
    }
}

/// Debug statistics for hash table analysis.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of slots in the probed region
    pub capacity: usize,
    /// Number of entries that triggers growth
    pub max_fill: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Whether the sentinel key is present
    pub has_sentinel_entry: bool,
    /// Largest distance of any entry from its home bucket
    pub longest_probe: usize,
    /// Average distance of entries from their home bucket
    pub mean_probe: f64,
    /// Total memory in bytes used by the backing arrays
    pub total_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load, grows at {})",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.max_fill
        );
        println!("Sentinel entry: {}", self.has_sentinel_entry);
        println!(
            "Probe distance: longest {}, mean {:.3}",
            self.longest_probe, self.mean_probe
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::strategy::DefaultStrategy;
    use crate::strategy::FnStrategy;

    type Collide = FnStrategy<fn(&u64) -> u64, fn(&u64, &u64) -> bool>;

    fn seven(_: &u64) -> u64 {
        7
    }

    fn same(a: &u64, b: &u64) -> bool {
        a == b
    }

    /// Every key hashes to the same bucket.
    fn colliding() -> Collide {
        FnStrategy::new(seven as fn(&u64) -> u64, same as fn(&u64, &u64) -> bool)
    }

    fn table<S: Strategy<u64>>(expected: usize, strategy: S) -> RawTable<u64, u64, S> {
        RawTable::new(&Config::new().expected(expected), strategy).unwrap()
    }

    fn insert<S: Strategy<u64>>(table: &mut RawTable<u64, u64, S>, key: u64, value: u64) {
        match table.find(&key) {
            Slot::Vacant(index) => table.put(index, key, value),
            Slot::Occupied(_) => panic!("duplicate key {key}"),
        }
    }

    fn remove<S: Strategy<u64>>(table: &mut RawTable<u64, u64, S>, key: u64) -> u64 {
        match table.find(&key) {
            Slot::Occupied(index) => table.take(index, |_, _, _| {}).1,
            Slot::Vacant(_) => panic!("missing key {key}"),
        }
    }

    #[test]
    fn slot_encoding() {
        assert_eq!(Slot::Occupied(3).encoded(), 3);
        assert_eq!(Slot::Vacant(0).encoded(), -1);
        assert_eq!(Slot::Vacant(5).encoded(), -6);
        assert!(Slot::Occupied(0).is_present());
        assert_eq!(Slot::Vacant(9).index(), 9);
    }

    #[test]
    fn sentinel_lives_past_the_region() {
        let mut t = table(4, DefaultStrategy);
        let n = t.capacity();
        assert_eq!(t.find(&0), Slot::Vacant(n));
        insert(&mut t, 0, 10);
        assert_eq!(t.find(&0), Slot::Occupied(n));
        assert_eq!(t.len(), 1);
        assert_eq!(t.count_live(), 1);
        assert_eq!(remove(&mut t, 0), 10);
        assert!(!t.has_sentinel());
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn backward_shift_closes_collision_chain() {
        let mut t = table(8, colliding());
        for k in 1..=6 {
            insert(&mut t, k, k * 10);
        }
        // Chain occupies 7, 8, 9, ... (mod 16) in insertion order.
        assert_eq!(remove(&mut t, 2), 20);
        for k in [1, 3, 4, 5, 6] {
            assert!(t.find(&k).is_present(), "lost {k}");
        }
        assert_eq!(t.count_live(), 5);

        let moves = {
            let mut moves = Vec::new();
            let index = t.find(&1).index();
            t.take(index, |from, to, key| moves.push((from, to, *key)));
            moves
        };
        assert_eq!(moves.len(), 4);
        assert_eq!(moves[0].2, 3);
        for k in [3, 4, 5, 6] {
            assert!(t.find(&k).is_present(), "lost {k}");
        }
    }

    #[test]
    fn backward_shift_across_wraparound() {
        let n = table::<Collide>(8, colliding()).capacity();
        let last_bucket = (0..1000u64).find(|&h| mix(h) as usize & (n - 1) == n - 1).unwrap();
        let strategy = FnStrategy::new(move |_: &u64| last_bucket, same);
        let mut t = table(8, strategy);
        for k in 1..=4 {
            insert(&mut t, k, k);
        }
        // Keys sit at n-1, 0, 1, 2.
        assert_eq!(t.find(&1), Slot::Occupied(n - 1));
        assert_eq!(t.find(&2), Slot::Occupied(0));

        let mut moves = Vec::new();
        t.take(n - 1, |from, to, _| moves.push((from, to)));
        assert_eq!(moves, vec![(0, n - 1), (1, 0), (2, 1)]);
        assert_eq!(t.find(&2), Slot::Occupied(n - 1));
        assert_eq!(t.find(&4), Slot::Occupied(1));
        assert!(t.keys[2].is_zero());
    }

    #[test]
    fn entries_in_their_home_bucket_do_not_move() {
        let mut t = table(8, DefaultStrategy);
        let n = t.capacity();
        let mask = n - 1;
        // Two keys with different home buckets that are adjacent.
        let a = (1..1000u64).find(|&k| mix(k) as usize & mask == 3).unwrap();
        let b = (1..1000u64).find(|&k| mix(k) as usize & mask == 4).unwrap();
        insert(&mut t, a, 1);
        insert(&mut t, b, 2);
        let mut moved = false;
        let index = t.find(&a).index();
        t.take(index, |_, _, _| moved = true);
        assert!(!moved);
        assert_eq!(t.find(&b), Slot::Occupied(4));
    }

    #[test]
    fn rehash_preserves_entries_and_tracks_index() {
        let mut t = table(4, DefaultStrategy);
        for k in 0..5 {
            insert(&mut t, k, k + 100);
        }
        let watched = t.find(&3).index();
        let moved = t.rehash(32, watched).unwrap();
        assert_eq!(t.capacity(), 32);
        assert_eq!(t.max_fill(), 24);
        assert_eq!(t.find(&3), Slot::Occupied(moved));
        for k in 0..5 {
            assert_eq!(t.get(&k), Some(&(k + 100)));
        }
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn rehash_detects_size_drift() {
        let mut t = table(4, DefaultStrategy);
        insert(&mut t, 1, 1);
        t.size += 1;
        assert_eq!(t.rehash(32, 0), Err(Error::ConcurrentModification));
        assert_eq!(t.get(&1), Some(&1));
    }

    #[test]
    fn trim_target_leaves_room_for_one_more() {
        let mut t = table(4096, DefaultStrategy);
        for k in 1..=12 {
            insert(&mut t, k, k);
        }
        assert_eq!(t.trim_target(12), Some(32));
        assert_eq!(t.trim_target(3), Some(32));
        assert_eq!(t.trim_target(100), Some(256));
        assert_eq!(t.trim_target(10_000), None);
    }

    #[test]
    fn shrinking_stops_at_the_slot_floor() {
        let mut t = table(0, DefaultStrategy);
        insert(&mut t, 1, 1);
        assert!(!t.should_shrink());

        t.rehash(MIN_SHRINK_SLOTS, 0).unwrap();
        assert!(!t.should_shrink());
        t.rehash(MIN_SHRINK_SLOTS * 2, 0).unwrap();
        assert!(t.should_shrink());
    }

    #[test]
    fn clear_and_trim_replaces_arrays() {
        let mut t = table(100, DefaultStrategy);
        for k in 1..50 {
            insert(&mut t, k, k);
        }
        assert_eq!(t.clear_and_trim(2), Some(4));
        assert_eq!(t.capacity(), 4);
        assert_eq!(t.keys.len(), 5);
        assert_eq!(t.len(), 0);
        assert_eq!(t.clear_and_trim(100), None);
    }
}
