use crate::error::Error;

/// Operations common to every table in this crate.
///
/// Mutators are fallible because a [`FrozenTable`](crate::FrozenTable)
/// rejects them with [`Error::Unsupported`]; the mutable tables always
/// succeed.
///
/// # Examples
///
/// ```rust
/// use opal_hash::FrozenTable;
/// use opal_hash::HashTable;
/// use opal_hash::Table;
///
/// fn bump(table: &mut impl Table<u32, u32>, key: u32) -> opal_hash::Result<()> {
///     let next = table.get(&key).copied().unwrap_or(0) + 1;
///     table.try_insert(key, next)?;
///     Ok(())
/// }
///
/// let mut table: HashTable<u32, u32> = HashTable::new();
/// bump(&mut table, 7).unwrap();
/// assert_eq!(table.get(&7), Some(&1));
///
/// let mut frozen: FrozenTable<u32, u32> = [(7, 1)].into_iter().collect();
/// assert!(bump(&mut frozen, 7).is_err());
/// ```
pub trait Table<K, V> {
    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the table holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value stored for `key`.
    fn get(&self, key: &K) -> Option<&V>;

    /// Returns `true` if the table holds `key`.
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Inserts an entry, returning the previous value for the key.
    fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, Error>;

    /// Removes `key`, returning its value if it was present.
    fn try_remove(&mut self, key: &K) -> Result<Option<V>, Error>;

    /// Removes every entry.
    fn try_clear(&mut self) -> Result<(), Error>;
}
