//! The remote package index.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default location of the package index.
pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/argosopentech/argospm-index/main/index.json";

/// A package listed in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailablePackage {
    /// Source language code
    pub from_code: String,
    /// Target language code
    pub to_code: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub to_name: String,
    #[serde(default)]
    pub package_version: String,
    #[serde(default)]
    pub argos_version: String,
    /// Download URLs, tried in order
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, rename = "type")]
    pub package_type: String,
}

impl AvailablePackage {
    /// File name of the downloaded archive.
    pub fn archive_name(&self) -> String {
        let mut name = format!("translate-{}_{}", self.from_code, self.to_code);
        if !self.package_version.is_empty() {
            name.push('-');
            name.push_str(&self.package_version.replace('.', "_"));
        }
        name.push_str(".argosmodel");
        name
    }

    /// Check if the package translates `from_code` into `to_code`.
    pub fn translates(&self, from_code: &str, to_code: &str) -> bool {
        self.from_code == from_code && self.to_code == to_code
    }
}

impl std::fmt::Display for AvailablePackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.from_name.is_empty(), self.to_name.is_empty()) {
            (false, false) => write!(f, "{} -> {}", self.from_name, self.to_name)?,
            _ => write!(f, "{} -> {}", self.from_code, self.to_code)?,
        }
        if !self.package_version.is_empty() {
            write!(f, " (v{})", self.package_version)?;
        }
        Ok(())
    }
}

/// A parsed package index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageIndex {
    packages: Vec<AvailablePackage>,
}

impl PackageIndex {
    /// Parse index JSON: an array of package entries.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            packages: serde_json::from_str(json)?,
        })
    }

    /// Read an index stored on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// All listed packages, in index order.
    pub fn packages(&self) -> &[AvailablePackage] {
        &self.packages
    }

    /// Take the listed packages.
    pub fn into_packages(self) -> Vec<AvailablePackage> {
        self.packages
    }

    /// First package translating exactly `from_code -> to_code`.
    pub fn find(&self, from_code: &str, to_code: &str) -> Option<&AvailablePackage> {
        self.packages.iter().find(|p| p.translates(from_code, to_code))
    }

    /// Number of listed packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the index lists nothing.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
