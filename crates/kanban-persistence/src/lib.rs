pub mod capability;
#[cfg(feature = "sqlite")]
pub mod migration;
pub mod store;
pub mod traits;

pub use capability::CapabilityFlags;
#[cfg(feature = "sqlite")]
pub use migration::{Migrator, MIGRATIONS, ORDERING_VERSION};
pub use store::*;
pub use traits::*;
