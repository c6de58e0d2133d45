//! Configuration inputs: the root `.fyrc.yaml`, provider declarations,
//! vault settings and the fy config directory layout.

pub mod paths;
pub mod providers;
pub mod rc;
pub mod vault;

pub use paths::FyPaths;
pub use providers::{ProviderEntry, discover_provider_files, load_provider_entries};
pub use rc::{FYRC_FILE, RootConfig};
pub use vault::VaultSettings;
