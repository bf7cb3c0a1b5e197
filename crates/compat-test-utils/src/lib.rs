//! Shared test utilities for the extension-compat workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! It deliberately depends on no workspace crate, so any sibling crate's
//! unit tests can use it without pulling a second build of that crate
//! into the test harness.
//!
//! # Modules
//!
//! - [`fixture`] — package directory builders and zip writers

pub mod fixture;
