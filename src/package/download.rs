//! Fetching the index and package archives.
//!
//! Sources are `http(s)://` URLs, fetched with a blocking reqwest client, or
//! local paths (optionally written as `file://` URLs), read from disk. Local
//! sources let mirrors and tests work without a network.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::error::Result;

const CHUNK_SIZE: usize = 64 * 1024;

/// Read a whole text resource.
pub fn fetch_string(source: &str) -> Result<String> {
    match local_path(source) {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            log::debug!("GET {}", source);
            Ok(client()?.get(source).send()?.error_for_status()?.text()?)
        }
    }
}

/// Copy a resource into `dest`, reporting `(downloaded, total)` bytes as
/// data arrives. Returns the number of bytes written.
///
/// Data lands in a `.part` file that is renamed to `dest` once complete, so
/// a failed download never leaves a truncated `dest` behind.
pub fn fetch_to_file(
    source: &str,
    dest: &Path,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = dest.with_extension("part");

    let written = match copy_source(source, &partial, progress) {
        Ok(written) => written,
        Err(e) => {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
    };

    fs::rename(&partial, dest)?;
    log::debug!("Fetched {} bytes from {}", written, source);
    Ok(written)
}

fn copy_source(
    source: &str,
    dest: &Path,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<u64> {
    let mut out = File::create(dest)?;

    let written = match local_path(source) {
        Some(path) => {
            let file = File::open(&path)?;
            let total = file.metadata()?.len();
            copy_with_progress(file, &mut out, Some(total), progress)?
        }
        None => {
            log::debug!("GET {}", source);
            let response = client()?.get(source).send()?.error_for_status()?;
            let total = response.content_length();
            copy_with_progress(response, &mut out, total, progress)?
        }
    };

    out.flush()?;
    Ok(written)
}

fn copy_with_progress<R: Read, W: Write>(
    mut reader: R,
    writer: &mut W,
    total: Option<u64>,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        downloaded += n as u64;
        progress(downloaded, total);
    }

    Ok(downloaded)
}

fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("doctrans/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// The filesystem path of a local source, `None` for remote URLs.
pub fn local_path(source: &str) -> Option<PathBuf> {
    if let Some(path) = source.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return None;
    }
    Some(PathBuf::from(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("file:///tmp/a.json"), Some(PathBuf::from("/tmp/a.json")));
        assert_eq!(local_path("mirror/index.json"), Some(PathBuf::from("mirror/index.json")));
        assert_eq!(local_path("https://example.com/index.json"), None);
        assert_eq!(local_path("http://example.com/index.json"), None);
    }

    #[test]
    fn test_fetch_local_file_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        fs::write(&src, vec![7u8; CHUNK_SIZE + 10]).unwrap();
        let dest = dir.path().join("out").join("dest.bin");

        let mut reports = Vec::new();
        let written = fetch_to_file(src.to_str().unwrap(), &dest, &mut |done, total| {
            reports.push((done, total))
        })
        .unwrap();

        assert_eq!(written, (CHUNK_SIZE + 10) as u64);
        assert_eq!(fs::read(&dest).unwrap().len(), CHUNK_SIZE + 10);
        assert_eq!(reports.last(), Some(&(written, Some(written))));
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_missing_local_source_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest.bin");
        let result = fetch_to_file("/definitely/not/here.bin", &dest, &mut |_, _| {});

        assert!(matches!(result, Err(crate::Error::Io(_))));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_fetch_string_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "[]").unwrap();
        let url = format!("file://{}", path.display());
        assert_eq!(fetch_string(&url).unwrap(), "[]");
    }
}
