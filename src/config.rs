//! Construction parameters shared by every table in this crate.

use crate::error::Error;

/// Number of entries a table is sized for when no size is given.
pub const DEFAULT_EXPECTED: usize = 16;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Tables shrink after a removal once fewer than `max_fill / divisor` entries
/// remain.
pub const DEFAULT_SHRINK_DIVISOR: usize = 4;

/// Tables never shrink on removal below this many slots.
pub const MIN_SHRINK_SLOTS: usize = 16;

/// Largest number of slots a table may have. Slot indices must fit the `u32`
/// links of the ordered tables.
pub const MAX_TABLE_SIZE: usize = 1 << 30;

/// Sizing and resizing policy of a table.
///
/// # Examples
///
/// ```rust
/// use opal_hash::Config;
/// use opal_hash::HashTable;
/// use opal_hash::strategy::DefaultStrategy;
///
/// let config = Config::new().expected(8).load_factor(0.5);
/// let table: HashTable<u32, u32> = HashTable::try_with_config(config, DefaultStrategy).unwrap();
/// assert_eq!(table.capacity(), 16);
/// assert_eq!(table.max_fill(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Number of entries the table must hold without growing.
    pub expected: usize,
    /// Target maximum fraction of occupied slots, in `(0, 1)`.
    pub load_factor: f32,
    /// Shrink threshold divisor; `0` disables shrinking on removal.
    pub shrink_divisor: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Returns the default configuration.
    pub const fn new() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            load_factor: DEFAULT_LOAD_FACTOR,
            shrink_divisor: DEFAULT_SHRINK_DIVISOR,
        }
    }

    /// Sets the number of entries to size for.
    pub const fn expected(mut self, expected: usize) -> Self {
        self.expected = expected;
        self
    }

    /// Sets the load factor.
    pub const fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the shrink threshold divisor.
    pub const fn shrink_divisor(mut self, shrink_divisor: usize) -> Self {
        self.shrink_divisor = shrink_divisor;
        self
    }

    /// Checks the configuration and returns the number of slots it asks for.
    pub fn validate(&self) -> Result<usize, Error> {
        check_load_factor(self.load_factor)?;
        table_size(self.expected, self.load_factor)
    }
}

pub(crate) fn check_load_factor(load_factor: f32) -> Result<(), Error> {
    if load_factor > 0.0 && load_factor < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidLoadFactor { load_factor })
    }
}

/// Smallest power of two able to hold `expected` entries at `load_factor`.
pub(crate) fn table_size(expected: usize, load_factor: f32) -> Result<usize, Error> {
    let exact = expected as f64 / load_factor as f64;
    if exact > MAX_TABLE_SIZE as f64 {
        return Err(Error::CapacityOverflow {
            requested: expected,
        });
    }
    let truncated = exact as usize;
    let wanted = if (truncated as f64) < exact {
        truncated + 1
    } else {
        truncated
    };
    Ok(wanted.max(2).next_power_of_two())
}

/// Number of entries a table of `n` slots takes before growing.
#[inline]
pub(crate) fn max_fill(n: usize, load_factor: f32) -> usize {
    ((n as f64 * load_factor as f64) as usize).min(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_powers_of_two() {
        assert_eq!(table_size(0, 0.75), Ok(2));
        assert_eq!(table_size(1, 0.75), Ok(2));
        assert_eq!(table_size(8, 0.75), Ok(16));
        assert_eq!(table_size(12, 0.75), Ok(16));
        assert_eq!(table_size(13, 0.75), Ok(32));
        assert_eq!(table_size(100, 0.5), Ok(256));
        assert_eq!(table_size(3, 0.75), Ok(4));
        assert_eq!(table_size(4, 0.75), Ok(8));
        assert_eq!(table_size(16, 0.5), Ok(32));
        assert_eq!(table_size(17, 0.5), Ok(64));
    }

    #[test]
    fn max_fill_stays_below_capacity() {
        assert_eq!(max_fill(16, 0.75), 12);
        assert_eq!(max_fill(2, 0.99), 1);
        assert_eq!(max_fill(2, 0.75), 1);
        assert_eq!(max_fill(1024, 0.5), 512);
    }

    #[test]
    fn rejects_bad_load_factors() {
        for load_factor in [0.0, 1.0, -0.5, 1.5, f32::NAN] {
            assert!(matches!(
                Config::new().load_factor(load_factor).validate(),
                Err(Error::InvalidLoadFactor { .. })
            ));
        }
    }

    #[test]
    fn rejects_oversized_tables() {
        assert_eq!(
            Config::new().expected(usize::MAX).validate(),
            Err(Error::CapacityOverflow {
                requested: usize::MAX
            })
        );
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(32));
        assert_eq!(config.shrink_divisor, DEFAULT_SHRINK_DIVISOR);
    }
}
