//! fss-core — wire format, phrase search, and configuration for FSS.
//! The other FSS crates depend on this one.

pub mod config;
pub mod search;
pub mod wire;

pub use search::{find_occurrences, Occurrences};
pub use wire::{FssFrame, MacAddr};
