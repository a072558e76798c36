//! Shared utilities.

pub mod ifname;
pub mod rate;

pub use ifname::{Device, NameCache, index_to_name, name_to_index};
