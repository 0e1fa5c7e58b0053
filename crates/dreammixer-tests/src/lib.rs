//! Integration test crate for Dreammixer.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It exercises the engine end to end over the test seams.

#[cfg(test)]
mod support;

#[cfg(test)]
mod mixer;

#[cfg(test)]
mod activation;
