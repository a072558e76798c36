//! Fixed-size netlink wire structures.

pub mod tc;
