//! Integration test crate for FilmSim.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! GPU tests return early when no adapter is available.

#[cfg(test)]
mod formats;

#[cfg(test)]
mod pipeline;

#[cfg(test)]
mod gpu;
