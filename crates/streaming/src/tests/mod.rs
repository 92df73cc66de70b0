//! Tests for the streaming crate.

mod helpers;

mod cluster;
mod diagnostics;
