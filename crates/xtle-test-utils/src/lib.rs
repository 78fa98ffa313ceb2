//! Shared test utilities for the xtle-fs workspace.
//!
//! Dev-dependency only, never published. Fixtures here write plain files and
//! know nothing about the sync crates, so any crate can use them.
//!
//! # Modules
//!
//! - [`translation`]: translation file content helpers
//! - [`project`]: [`TestProject`](project::TestProject) builder for a
//!   project directory with config and translation files

pub mod project;
pub mod translation;
