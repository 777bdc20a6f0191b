use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::Config;
use crate::config::DEFAULT_LOAD_FACTOR;
use crate::error::Error;
use crate::links::Order;
use crate::linked_table::IntoIter;
use crate::linked_table::Iter;
use crate::linked_table::Keys;
use crate::linked_table::Values;
use crate::raw::RawTable;
use crate::raw::Slot;
use crate::strategy::DefaultStrategy;
use crate::strategy::Key;
use crate::strategy::Strategy;
use crate::table::Table;

/// How a [`FrozenBuilder`] treats a key that occurs more than once in its
/// source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Duplicates {
    /// Keep the position of the first occurrence and the value of the last.
    #[default]
    LastValueWins,
    /// Keep the first occurrence and ignore later ones.
    FirstValueWins,
    /// Fail the build with [`Error::DuplicateKey`].
    Reject,
}

/// Builds a [`FrozenTable`] in a single pass.
///
/// # Examples
///
/// ```rust
/// use opal_hash::Error;
/// use opal_hash::frozen_table::Duplicates;
/// use opal_hash::frozen_table::FrozenBuilder;
///
/// let table = FrozenBuilder::new()
///     .load_factor(0.5)
///     .build([(1u32, 'a'), (2, 'b'), (1, 'c')])
///     .unwrap();
/// assert_eq!(table.get(&1), Some(&'c'));
/// assert_eq!(table.first(), Some((&1, &'c')));
///
/// let rejected = FrozenBuilder::new()
///     .duplicates(Duplicates::Reject)
///     .build([(1u32, 'a'), (1, 'b')]);
/// assert_eq!(rejected.unwrap_err(), Error::DuplicateKey);
/// ```
#[derive(Clone, Debug)]
pub struct FrozenBuilder<S = DefaultStrategy> {
    load_factor: f32,
    duplicates: Duplicates,
    strategy: S,
}

impl FrozenBuilder<DefaultStrategy> {
    /// Creates a builder with the default load factor, duplicate policy and
    /// strategy.
    pub fn new() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            duplicates: Duplicates::default(),
            strategy: DefaultStrategy,
        }
    }
}

impl Default for FrozenBuilder<DefaultStrategy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FrozenBuilder<S> {
    /// Sets the load factor the table is sized with.
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the duplicate key policy.
    pub fn duplicates(mut self, duplicates: Duplicates) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Replaces the hashing strategy.
    pub fn strategy<T>(self, strategy: T) -> FrozenBuilder<T> {
        FrozenBuilder {
            load_factor: self.load_factor,
            duplicates: self.duplicates,
            strategy,
        }
    }

    /// Builds a table from a source of known length. Entries keep the order
    /// of their first occurrence.
    ///
    /// Fails with [`Error::LengthMismatch`] if the source yields more entries
    /// than it announced, and with [`Error::DuplicateKey`] under
    /// [`Duplicates::Reject`].
    pub fn build<K, V, I>(self, entries: I) -> Result<FrozenTable<K, V, S>, Error>
    where
        K: Key,
        V: Default,
        S: Strategy<K>,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        let expected = entries.len();
        let config = Config::new()
            .expected(expected)
            .load_factor(self.load_factor)
            .shrink_divisor(0);
        let mut raw = RawTable::new(&config, self.strategy)?;
        let mut order = Order::with_slots(raw.capacity())?;

        for (seen, (key, value)) in entries.enumerate() {
            if seen == expected {
                return Err(Error::LengthMismatch {
                    expected,
                    actual: seen + 1,
                });
            }

            match raw.find(&key) {
                Slot::Occupied(index) => match self.duplicates {
                    Duplicates::LastValueWins => raw.values[index] = value,
                    Duplicates::FirstValueWins => {}
                    Duplicates::Reject => return Err(Error::DuplicateKey),
                },
                Slot::Vacant(index) => {
                    raw.put(index, key, value);
                    order.append(index);
                }
            }
        }

        Ok(FrozenTable { raw, order })
    }

    /// Builds a table from parallel key and value slices.
    ///
    /// Fails with [`Error::LengthMismatch`] if the slices differ in length.
    pub fn build_parallel<K, V>(
        self,
        keys: &[K],
        values: &[V],
    ) -> Result<FrozenTable<K, V, S>, Error>
    where
        K: Key + Clone,
        V: Default + Clone,
        S: Strategy<K>,
    {
        if keys.len() != values.len() {
            return Err(Error::LengthMismatch {
                expected: keys.len(),
                actual: values.len(),
            });
        }
        self.build(keys.iter().cloned().zip(values.iter().cloned()))
    }
}

/// An immutable, insertion-ordered hash table.
///
/// A `FrozenTable` is sized once for its source and never resizes. Lookups
/// and ordered traversal use the same probing and link code as
/// [`LinkedHashTable`](crate::LinkedHashTable). Every mutator returns
/// [`Error::Unsupported`] and leaves the table untouched.
///
/// ## Example
///
/// ```rust
/// use opal_hash::FrozenTable;
///
/// let mut table: FrozenTable<i64, f32> = [(-1, 0.5), (7, 1.5)].into_iter().collect();
/// assert_eq!(table.get(&7), Some(&1.5));
/// assert!(table.insert(3, 2.5).is_err());
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone)]
pub struct FrozenTable<K, V, S = DefaultStrategy> {
    raw: RawTable<K, V, S>,
    order: Order,
}

impl<K, V, S> Debug for FrozenTable<K, V, S>
where
    K: Key + Debug,
    V: Default + Debug,
    S: Strategy<K>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FrozenTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    /// Returns a builder for a frozen table.
    pub fn builder() -> FrozenBuilder<DefaultStrategy> {
        FrozenBuilder::new()
    }
}

impl<K, V, S> FrozenTable<K, V, S>
where
    K: Key,
    V: Default,
    S: Strategy<K>,
{
    pub(crate) fn from_parts(raw: RawTable<K, V, S>, order: Order) -> Self {
        Self { raw, order }
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

    /// Returns the load factor the table was sized with.
    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor()
    }

    /// Returns the strategy used for hashing and equality.
    pub fn strategy(&self) -> &S {
        self.raw.strategy()
    }

    /// Probes for `key`.
    pub fn find(&self, key: &K) -> Slot {
        self.raw.find(key)
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

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key).is_present()
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

    /// Returns an iterator over the entries in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw.keys, &self.raw.values, &self.order, self.raw.len())
    }

    /// Returns an iterator over the entries in order, starting at `key`.
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

    /// Always fails: frozen tables cannot gain entries.
    pub fn insert(&mut self, _key: K, _value: V) -> Result<Option<V>, Error> {
        Err(Error::Unsupported {
            operation: "insert",
        })
    }

    /// Always fails: frozen tables cannot lose entries.
    pub fn remove(&mut self, _key: &K) -> Result<Option<V>, Error> {
        Err(Error::Unsupported {
            operation: "remove",
        })
    }

    /// Always fails: frozen tables cannot lose entries.
    pub fn clear(&mut self) -> Result<(), Error> {
        Err(Error::Unsupported { operation: "clear" })
    }

    /// Always fails: the order of a frozen table is fixed.
    pub fn move_to_first(&mut self, _key: &K) -> Result<bool, Error> {
        Err(Error::Unsupported {
            operation: "move_to_first",
        })
    }

    /// Always fails: the order of a frozen table is fixed.
    pub fn move_to_last(&mut self, _key: &K) -> Result<bool, Error> {
        Err(Error::Unsupported {
            operation: "move_to_last",
        })
    }

    /// Always fails: values of a frozen table cannot be modified.
    pub fn get_mut(&mut self, _key: &K) -> Result<Option<&mut V>, Error> {
        Err(Error::Unsupported {
            operation: "get_mut",
        })
    }

    /// Always fails: a frozen table never resizes.
    pub fn trim_to(&mut self, _expected: usize) -> Result<bool, Error> {
        Err(Error::Unsupported {
            operation: "trim_to",
        })
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

impl<K, V, S> PartialEq for FrozenTable<K, V, S>
where
    K: Key,
    V: Default + PartialEq,
    S: Strategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> FromIterator<(K, V)> for FrozenTable<K, V, DefaultStrategy>
where
    K: Key,
    V: Default,
{
    /// Collects the entries and builds with the default settings.
    ///
    /// # Panics
    ///
    /// Panics if the table cannot be sized or allocated.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let entries: Vec<(K, V)> = iter.into_iter().collect();
        match FrozenBuilder::new().build(entries) {
            Ok(table) => table,
            Err(err) => panic!("cannot build frozen table: {err}"),
        }
    }
}

impl<K, V, S> Table<K, V> for FrozenTable<K, V, S>
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
        self.insert(key, value)
    }

    fn try_remove(&mut self, key: &K) -> Result<Option<V>, Error> {
        self.remove(key)
    }

    fn try_clear(&mut self) -> Result<(), Error> {
        self.clear()
    }
}

impl<K, V, S> IntoIterator for FrozenTable<K, V, S>
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

impl<'a, K, V, S> IntoIterator for &'a FrozenTable<K, V, S>
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
