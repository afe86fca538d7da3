//! Making sure a translation package is installed.

use std::path::Path;

use crate::error::{Error, Result};

use super::index::AvailablePackage;
use super::registry::{InstalledPackage, PackageRegistry};

/// Receives progress while a package is provisioned.
pub trait ProvisionObserver {
    /// The index was refreshed and lists `count` packages.
    fn on_index_updated(&mut self, _count: usize) {}

    /// The archive of `package` is about to be downloaded.
    fn on_download_start(&mut self, _package: &AvailablePackage) {}

    /// `downloaded` bytes of the archive have arrived.
    fn on_download_progress(&mut self, _downloaded: u64, _total: Option<u64>) {}

    /// The archive at `archive` is being unpacked.
    fn on_installing(&mut self, _archive: &Path) {}

    /// The package is installed.
    fn on_installed(&mut self, _package: &InstalledPackage) {}
}

impl ProvisionObserver for () {}

/// Install the package translating `from_code -> to_code`.
///
/// Refreshes the index, picks the first package for the exact pair,
/// downloads it and installs it, replacing any installed copy. Fails with
/// `Error::NoPackageAvailable` when the index has no such package.
pub fn ensure_model_installed(
    from_code: &str,
    to_code: &str,
    registry: &PackageRegistry,
    observer: &mut dyn ProvisionObserver,
) -> Result<InstalledPackage> {
    let index = registry.update_package_index()?;
    observer.on_index_updated(index.len());

    let available = registry.available_packages()?;
    let package = available
        .iter()
        .find(|p| p.translates(from_code, to_code))
        .ok_or_else(|| Error::NoPackageAvailable {
            from: from_code.to_string(),
            to: to_code.to_string(),
        })?;

    observer.on_download_start(package);
    let archive = registry.download(package, &mut |downloaded, total| {
        observer.on_download_progress(downloaded, total)
    })?;

    observer.on_installing(&archive);
    let installed = registry.install_from_path(&archive)?;
    observer.on_installed(&installed);

    Ok(installed)
}
