//! Shared utilities for the MERA-400 AWP emulation crates

pub mod num;
