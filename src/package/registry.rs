//! The local package registry: installed packages, the cached index and
//! downloaded archives.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::error::{Error, Result};

use super::download::{fetch_string, fetch_to_file};
use super::index::{AvailablePackage, PackageIndex, DEFAULT_INDEX_URL};

const APP_DIR: &str = "doctrans";
const METADATA_FILE: &str = "metadata.json";

/// The `metadata.json` of an installed package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageMetadata {
    pub from_code: String,
    pub to_code: String,
    pub from_name: String,
    pub to_name: String,
    pub package_version: String,
    pub argos_version: String,
    /// Token forced at the start of every translation (multilingual models)
    pub target_prefix: String,
}

/// A package unpacked in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPackage {
    /// Package directory
    pub path: PathBuf,
    pub metadata: PackageMetadata,
}

impl InstalledPackage {
    /// Read the package in `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        let json = fs::read_to_string(path.join(METADATA_FILE))?;
        let metadata = serde_json::from_str(&json)
            .map_err(|e| Error::PackageInstall(format!("{}: {}", path.display(), e)))?;
        Ok(Self { path, metadata })
    }

    /// The CTranslate2 model directory.
    pub fn model_dir(&self) -> PathBuf {
        self.path.join("model")
    }

    /// The SentencePiece tokenizer model.
    pub fn sentencepiece_model(&self) -> PathBuf {
        self.path.join("sentencepiece.model")
    }

    /// Check if the package translates `from_code` into `to_code`.
    pub fn translates(&self, from_code: &str, to_code: &str) -> bool {
        self.metadata.from_code == from_code && self.metadata.to_code == to_code
    }
}

/// Where packages, the index and downloads live.
#[derive(Debug, Clone)]
pub struct PackageRegistry {
    data_dir: PathBuf,
    cache_dir: PathBuf,
    index_url: String,
}

impl PackageRegistry {
    /// The per-user registry under the platform data and cache directories.
    pub fn default_location() -> Result<Self> {
        let data = dirs::data_dir()
            .ok_or_else(|| Error::Other("cannot determine the user data directory".into()))?;
        let cache = dirs::cache_dir().unwrap_or_else(|| data.clone());
        Ok(Self {
            data_dir: data.join(APP_DIR),
            cache_dir: cache.join(APP_DIR),
            index_url: DEFAULT_INDEX_URL.to_string(),
        })
    }

    /// A registry rooted at `dir`, with downloads under `dir/cache`.
    pub fn at<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            cache_dir: dir.join("cache"),
            data_dir: dir,
            index_url: DEFAULT_INDEX_URL.to_string(),
        }
    }

    /// Fetch the index from `url` (an HTTP(S) URL or a local path).
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    /// Index URL in use.
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Directory holding installed packages.
    pub fn packages_dir(&self) -> PathBuf {
        self.data_dir.join("packages")
    }

    /// Cached copy of the index.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.json")
    }

    /// Directory for downloaded archives.
    pub fn downloads_dir(&self) -> PathBuf {
        self.cache_dir.join("downloads")
    }

    /// Download the index and store it locally.
    pub fn update_package_index(&self) -> Result<PackageIndex> {
        log::info!("Updating package index from {}", self.index_url);
        let json = fetch_string(&self.index_url)?;
        let index = PackageIndex::from_json(&json)?;

        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.index_path(), json)?;
        log::debug!("Index lists {} packages", index.len());
        Ok(index)
    }

    /// Packages listed in the stored index.
    pub fn available_packages(&self) -> Result<Vec<AvailablePackage>> {
        let path = self.index_path();
        if !path.is_file() {
            return Err(Error::PackageIndex(format!(
                "no index at {}; update the package index first",
                path.display()
            )));
        }
        Ok(PackageIndex::load(path)?.into_packages())
    }

    /// Download a package archive, trying each link in order.
    ///
    /// `progress` receives `(downloaded, total)` bytes for the link being
    /// fetched. Returns the path of the archive.
    pub fn download(
        &self,
        package: &AvailablePackage,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<PathBuf> {
        let dest = self.downloads_dir().join(package.archive_name());
        let mut last_error = None;

        for link in &package.links {
            log::info!("Downloading {} from {}", package, link);
            match fetch_to_file(link, &dest, progress) {
                Ok(_) => return Ok(dest),
                Err(e) => {
                    log::warn!("Download from {} failed: {}", link, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::PackageInstall(format!("package {} has no download links", package))
        }))
    }

    /// Unpack a package archive into the registry.
    ///
    /// The archive holds a single top-level package directory. It is unpacked
    /// and checked beside the registry first; an installed copy of that
    /// directory is only replaced once the new one is complete.
    pub fn install_from_path<P: AsRef<Path>>(&self, archive: P) -> Result<InstalledPackage> {
        let archive = archive.as_ref();
        let mut zip = ZipArchive::new(File::open(archive)?)?;

        let mut roots = BTreeSet::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if let Some(root) = entry.enclosed_name().and_then(|p| p.components().next()) {
                roots.insert(PathBuf::from(root.as_os_str()));
            }
        }
        let root = match (roots.len(), roots.into_iter().next()) {
            (1, Some(root)) => root,
            (n, _) => {
                return Err(Error::PackageInstall(format!(
                    "{}: expected one package directory, found {}",
                    archive.display(),
                    n
                )))
            }
        };

        let packages_dir = self.packages_dir();
        fs::create_dir_all(&packages_dir)?;

        // Unpack next to the installed packages, then swap into place
        let mut staging_name = OsString::from(".");
        staging_name.push(root.as_os_str());
        staging_name.push(".partial");
        let staging = packages_dir.join(staging_name);
        if staging.exists() {
            remove_path(&staging)?;
        }

        let staged = match unpack_package(&mut zip, &staging, &root) {
            Ok(staged) => staged,
            Err(e) => {
                if let Err(cleanup) = remove_path(&staging) {
                    log::warn!("Could not remove {}: {}", staging.display(), cleanup);
                }
                return Err(match e {
                    Error::PackageInstall(msg) => {
                        Error::PackageInstall(format!("{}: {}", archive.display(), msg))
                    }
                    other => other,
                });
            }
        };

        let target = packages_dir.join(&root);
        if target.exists() {
            log::debug!("Replacing {}", target.display());
            remove_path(&target)?;
        }
        fs::rename(&staged, &target)?;
        remove_path(&staging)?;

        let package = InstalledPackage::load(&target)?;
        log::info!("Installed package into {}", target.display());
        Ok(package)
    }

    /// Packages installed in the registry, ordered by directory name.
    ///
    /// Directories without readable metadata are skipped.
    pub fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let dir = self.packages_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut packages = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.join(METADATA_FILE).is_file() {
                continue;
            }
            match InstalledPackage::load(&path) {
                Ok(package) => packages.push(package),
                Err(e) => log::warn!("Skipping package {}: {}", path.display(), e),
            }
        }
        packages.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(packages)
    }

    /// The installed package for `from_code -> to_code`, if any.
    pub fn find_installed(&self, from_code: &str, to_code: &str) -> Result<Option<InstalledPackage>> {
        Ok(self
            .installed_packages()?
            .into_iter()
            .find(|p| p.translates(from_code, to_code)))
    }
}

/// Extract every entry of `zip` under `staging` and check that `root`
/// unpacked into a package directory with readable metadata.
fn unpack_package(zip: &mut ZipArchive<File>, staging: &Path, root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(staging)?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let out_path = match entry.enclosed_name() {
            Some(path) => staging.join(path),
            None => continue,
        };

        if entry.name().ends_with('/') {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    let staged = staging.join(root);
    if !staged.join(METADATA_FILE).is_file() {
        return Err(Error::PackageInstall(format!("package has no {}", METADATA_FILE)));
    }
    InstalledPackage::load(&staged)?;
    Ok(staged)
}

fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
