//! Translation model packages.
//!
//! Packages are `.argosmodel` zip archives listed in a JSON index. Each holds
//! one directory with a `metadata.json`, a CTranslate2 `model/` directory and
//! a `sentencepiece.model`. [`ensure_model_installed`] refreshes the index,
//! downloads the package for a language pair and unpacks it into a
//! [`PackageRegistry`].

mod download;
mod index;
mod provision;
mod registry;

pub use download::{fetch_string, fetch_to_file, local_path};
pub use index::{AvailablePackage, PackageIndex, DEFAULT_INDEX_URL};
pub use provision::{ensure_model_installed, ProvisionObserver};
pub use registry::{InstalledPackage, PackageMetadata, PackageRegistry};
