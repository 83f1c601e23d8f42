//! Integration test crate for Overmix.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the core and engine crates to verify they work together.

#[cfg(test)]
mod bounce;

#[cfg(test)]
mod mixdown;
