use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Deterministic hasher builder used for the natural hash of
        /// reference keys.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Deterministic hasher builder used for the natural hash of
        /// reference keys.
        pub type DefaultHashBuilder =
            core::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;
    }
}

/// A key type that can live in the flat key array.
///
/// The table never stores a separate "occupied" flag: a slot is empty exactly
/// when its key is bit-identical to `Self::default()`. That value is the
/// *sentinel key*, and it is kept in a dedicated slot past the end of the
/// probed region so that it remains a legal key.
pub trait Key: Default {
    /// Returns `true` if `self` has the same bit pattern as
    /// `Self::default()`.
    ///
    /// For floating point keys this is `+0.0` only; `-0.0` is a normal key.
    fn is_zero(&self) -> bool;

    /// The hash used by [`DefaultStrategy`].
    fn natural_hash(&self) -> u64;

    /// The equality used by [`DefaultStrategy`]. Must be reflexive, which
    /// is why floating point keys compare by bits.
    fn natural_eq(&self, other: &Self) -> bool;
}

macro_rules! integer_key {
    ($($t:ty),* $(,)?) => {$(
        impl Key for $t {
            #[inline(always)]
            fn is_zero(&self) -> bool {
                *self == 0
            }

            #[inline(always)]
            fn natural_hash(&self) -> u64 {
                *self as u64
            }

            #[inline(always)]
            fn natural_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    )*};
}

integer_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! wide_integer_key {
    ($($t:ty),* $(,)?) => {$(
        impl Key for $t {
            #[inline(always)]
            fn is_zero(&self) -> bool {
                *self == 0
            }

            #[inline(always)]
            fn natural_hash(&self) -> u64 {
                let bits = *self as u128;
                (bits ^ (bits >> 64)) as u64
            }

            #[inline(always)]
            fn natural_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    )*};
}

wide_integer_key!(i128, u128);

macro_rules! float_key {
    ($($t:ty),* $(,)?) => {$(
        impl Key for $t {
            #[inline(always)]
            fn is_zero(&self) -> bool {
                self.to_bits() == 0
            }

            #[inline(always)]
            fn natural_hash(&self) -> u64 {
                self.to_bits() as u64
            }

            #[inline(always)]
            fn natural_eq(&self, other: &Self) -> bool {
                self.to_bits() == other.to_bits()
            }
        }
    )*};
}

float_key!(f32, f64);

impl Key for bool {
    #[inline(always)]
    fn is_zero(&self) -> bool {
        !*self
    }

    #[inline(always)]
    fn natural_hash(&self) -> u64 {
        *self as u64
    }

    #[inline(always)]
    fn natural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl Key for char {
    #[inline(always)]
    fn is_zero(&self) -> bool {
        *self == '\0'
    }

    #[inline(always)]
    fn natural_hash(&self) -> u64 {
        *self as u64
    }

    #[inline(always)]
    fn natural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// Reference keys. `None` plays the part of the absent reference.
#[cfg(any(feature = "foldhash", feature = "std"))]
impl<T: Hash + Eq> Key for Option<T> {
    #[inline]
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    #[inline]
    fn natural_hash(&self) -> u64 {
        match self {
            Some(value) => DefaultHashBuilder::default().hash_one(value),
            None => 0,
        }
    }

    #[inline]
    fn natural_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// Hash and equality policy for the keys of a table.
///
/// Implementations must be consistent: `equals(a, b)` implies
/// `hash(a) == hash(b)`, and `equals` must be an equivalence relation. The
/// table applies its own mixing step to the returned hash, so strategies may
/// return clustered values such as the key itself.
pub trait Strategy<K> {
    /// Hashes a key.
    fn hash(&self, key: &K) -> u64;

    /// Compares two keys.
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// Strategy using the natural hash and equality of a [`Key`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultStrategy;

impl<K: Key> Strategy<K> for DefaultStrategy {
    #[inline(always)]
    fn hash(&self, key: &K) -> u64 {
        key.natural_hash()
    }

    #[inline(always)]
    fn equals(&self, a: &K, b: &K) -> bool {
        a.natural_eq(b)
    }
}

/// Strategy hashing `Hash + Eq` keys through a [`BuildHasher`].
///
/// The hasher builder must produce the same hash for the same key every time
/// it is asked, so per-instance random states are fine but per-call random
/// states are not.
#[derive(Clone, Debug, Default)]
pub struct HashStrategy<S> {
    hash_builder: S,
}

impl<S> HashStrategy<S> {
    /// Creates a strategy from a hasher builder.
    pub fn new(hash_builder: S) -> Self {
        Self { hash_builder }
    }

    /// Returns the hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<K, S> Strategy<K> for HashStrategy<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Strategy built from a pair of closures.
///
/// # Examples
///
/// ```rust
/// use opal_hash::LinkedHashTable;
/// use opal_hash::strategy::FnStrategy;
///
/// // Case-insensitive string keys.
/// let strategy = FnStrategy::new(
///     |k: &Option<String>| {
///         k.as_deref()
///             .map(|s| {
///                 s.bytes().fold(0u64, |h, b| {
///                     h.wrapping_mul(31).wrapping_add(b.to_ascii_lowercase() as u64)
///                 })
///             })
///             .unwrap_or(0)
///     },
///     |a: &Option<String>, b: &Option<String>| match (a, b) {
///         (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
///         (None, None) => true,
///         _ => false,
///     },
/// );
///
/// let mut table = LinkedHashTable::with_strategy(strategy);
/// table.insert(Some("Hello".to_string()), 1);
/// assert_eq!(table.get(&Some("HELLO".to_string())), Some(&1));
/// ```
#[derive(Clone, Copy)]
pub struct FnStrategy<H, E> {
    hash: H,
    equals: E,
}

impl<H, E> FnStrategy<H, E> {
    /// Creates a strategy from a hash function and an equality predicate.
    pub fn new(hash: H, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<K, H, E> Strategy<K> for FnStrategy<H, E>
where
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.equals)(a, b)
    }
}

impl<K, T: Strategy<K> + ?Sized> Strategy<K> for &T {
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (**self).hash(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (**self).equals(a, b)
    }
}

/// Spreads clustered hash codes before they are masked down to a bucket.
#[inline(always)]
pub(crate) fn mix(x: u64) -> u64 {
    let h = x.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let h = h ^ (h >> 32);
    h ^ (h >> 16)
}
