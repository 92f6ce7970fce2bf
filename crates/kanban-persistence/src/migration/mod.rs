//! Versioned SQLite schema migrations.

pub mod migrator;

pub use migrator::{Migration, Migrator, MIGRATIONS, ORDERING_VERSION};
