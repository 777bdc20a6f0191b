#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;

pub mod error;

/// Open-addressing hash table with linear probing and backward-shift
/// deletion.
///
/// This module provides [`HashTable`], the unordered table, together with
/// its entry, iterator and cursor types.
pub mod hash_table;

/// A hash table that keeps its entries in insertion or access order.
pub mod linked_table;

/// An immutable ordered hash table built in one pass.
pub mod frozen_table;

/// Key capabilities and pluggable hash/equality strategies.
pub mod strategy;

mod links;
mod raw;
mod table;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use frozen_table::FrozenTable;
pub use hash_table::HashTable;
pub use linked_table::LinkedHashTable;
pub use raw::Slot;
#[cfg(feature = "stats")]
pub use raw::DebugStats;
pub use strategy::DefaultStrategy;
pub use strategy::Key;
pub use strategy::Strategy;
pub use table::Table;
