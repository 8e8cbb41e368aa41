//! Archive transports: moving a bundle in and out of one storable unit.
//!
//! ## Table of Contents
//! - **ArchiveTransport**: trait every transport implements
//! - **MemoryTransport**: in-memory slot, for tests and previews
//! - **DirectoryTransport**: one file per stream under a root directory
//! - **TarTransport**: a single tar archive file
//!
//! Transports move bytes only. They never look inside the documents, so a
//! bundle packed and unpacked through any transport is byte-identical.

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::files::BundleFiles;
use crate::BundleError;

/// A destination and source for packed bundles.
#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    /// Store every stream of `files` as one unit, replacing what was there.
    async fn pack(&self, files: &BundleFiles) -> Result<(), BundleError>;

    /// Read the stored unit back into named streams.
    async fn unpack(&self) -> Result<BundleFiles, BundleError>;

    /// Transport name for logging.
    fn name(&self) -> &str;
}

/// Reject paths that would escape the bundle root.
fn check_relative(path: &str) -> Result<(), BundleError> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.is_empty() {
        return Err(BundleError::Archive {
            details: format!("stream path '{path}' is not relative to the bundle root"),
        });
    }
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BundleError + '_ {
    move |source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// MemoryTransport
// ---------------------------------------------------------------------------

/// Holds the last packed bundle in memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    slot: RwLock<Option<BundleFiles>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that already holds `files`, ready to unpack.
    pub fn with_files(files: BundleFiles) -> Self {
        Self {
            slot: RwLock::new(Some(files)),
        }
    }
}

#[async_trait]
impl ArchiveTransport for MemoryTransport {
    async fn pack(&self, files: &BundleFiles) -> Result<(), BundleError> {
        *self.slot.write().await = Some(files.clone());
        Ok(())
    }

    async fn unpack(&self) -> Result<BundleFiles, BundleError> {
        self.slot
            .read()
            .await
            .clone()
            .ok_or_else(|| BundleError::Archive {
                details: "memory transport holds no bundle".to_owned(),
            })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// DirectoryTransport
// ---------------------------------------------------------------------------

/// Lays a bundle out as plain files under `root`.
///
/// Packing overwrites the bundle's streams and deletes any other file under
/// `root`, then prunes directories left empty.
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
    root: PathBuf,
}

impl DirectoryTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every regular file under the root as `(path, stream name)`, plus every
    /// subdirectory, parents before children.
    async fn scan(&self) -> Result<(Vec<(PathBuf, String)>, Vec<PathBuf>), BundleError> {
        let mut found = Vec::new();
        let mut dirs = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_error(&dir))?;
            while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir))? {
                let path = entry.path();
                let kind = entry.file_type().await.map_err(io_error(&path))?;
                if kind.is_dir() {
                    dirs.push(path.clone());
                    pending.push(path);
                } else if kind.is_file() {
                    let relative = path.strip_prefix(&self.root).unwrap_or(&path);
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    found.push((path, name));
                }
            }
        }
        Ok((found, dirs))
    }
}

#[async_trait]
impl ArchiveTransport for DirectoryTransport {
    async fn pack(&self, files: &BundleFiles) -> Result<(), BundleError> {
        for (path, _) in files.iter() {
            check_relative(path)?;
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(io_error(&self.root))?;
        for (path, bytes) in files.iter() {
            let target = self.root.join(path);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(io_error(parent))?;
            }
            tokio::fs::write(&target, bytes)
                .await
                .map_err(io_error(&target))?;
        }

        let (existing, mut dirs) = self.scan().await?;
        let mut stale = 0;
        for (path, name) in existing {
            if !files.contains(&name) {
                debug!(stream = %name, "removing stale bundle stream");
                tokio::fs::remove_file(&path).await.map_err(io_error(&path))?;
                stale += 1;
            }
        }
        // Deepest first, so emptied parents are seen empty.
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for dir in dirs {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_error(&dir))?;
            if entries.next_entry().await.map_err(io_error(&dir))?.is_none() {
                tokio::fs::remove_dir(&dir).await.map_err(io_error(&dir))?;
            }
        }

        info!(root = %self.root.display(), streams = files.len(), stale, "bundle written to directory");
        Ok(())
    }

    async fn unpack(&self) -> Result<BundleFiles, BundleError> {
        let mut files = BundleFiles::new();
        for (path, name) in self.scan().await?.0 {
            let bytes = tokio::fs::read(&path).await.map_err(io_error(&path))?;
            debug!(stream = %name, bytes = bytes.len(), "read bundle stream");
            files.insert(name, bytes);
        }
        info!(root = %self.root.display(), streams = files.len(), "bundle read from directory");
        Ok(files)
    }

    fn name(&self) -> &str {
        "directory"
    }
}

// ---------------------------------------------------------------------------
// TarTransport
// ---------------------------------------------------------------------------

/// Stores a bundle as a single uncompressed tar file.
#[derive(Debug, Clone)]
pub struct TarTransport {
    path: PathBuf,
}

impl TarTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `files` as tar bytes. Entries are written in path order with
    /// fixed metadata, so equal bundles give equal archives.
    pub fn encode(files: &BundleFiles) -> Result<Vec<u8>, BundleError> {
        let archive_err = |e: std::io::Error| BundleError::Archive {
            details: e.to_string(),
        };
        let mut builder = tar::Builder::new(Vec::new());
        for (path, bytes) in files.iter() {
            check_relative(path)?;
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder
                .append_data(&mut header, path, bytes)
                .map_err(archive_err)?;
        }
        builder.into_inner().map_err(archive_err)
    }

    /// Decode tar bytes into named streams. Directory entries are skipped.
    pub fn decode(bytes: &[u8]) -> Result<BundleFiles, BundleError> {
        let archive_err = |e: std::io::Error| BundleError::Archive {
            details: e.to_string(),
        };
        let mut archive = tar::Archive::new(bytes);
        let mut files = BundleFiles::new();
        for entry in archive.entries().map_err(archive_err)? {
            let mut entry = entry.map_err(archive_err)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .map_err(archive_err)?
                .to_string_lossy()
                .replace('\\', "/");
            check_relative(&name)?;
            // Header sizes are untrusted; let the buffer grow with the data.
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(archive_err)?;
            files.insert(name, data);
        }
        Ok(files)
    }
}

#[async_trait]
impl ArchiveTransport for TarTransport {
    async fn pack(&self, files: &BundleFiles) -> Result<(), BundleError> {
        let bytes = Self::encode(files)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }
        tokio::fs::write(&self.path, &bytes)
            .await
            .map_err(io_error(&self.path))?;
        info!(path = %self.path.display(), bytes = bytes.len(), "bundle written to tar");
        Ok(())
    }

    async fn unpack(&self) -> Result<BundleFiles, BundleError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(io_error(&self.path))?;
        let files = Self::decode(&bytes)?;
        info!(path = %self.path.display(), streams = files.len(), "bundle read from tar");
        Ok(files)
    }

    fn name(&self) -> &str {
        "tar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BundleFiles {
        let mut files = BundleFiles::new();
        files.insert("scene.json", br#"{"version":1,"assets":[]}"#.to_vec());
        files.insert("assets/Box/box.glb", vec![0, 1, 2, 255]);
        files.insert("assets/Box/textures/wood.png", vec![7; 600]);
        files
    }

    #[test]
    fn parent_directory_paths_are_rejected() {
        assert!(check_relative("assets/../../etc/passwd").is_err());
        assert!(check_relative("/abs").is_err());
        assert!(check_relative("assets/Box/box.glb").is_ok());
    }

    #[test]
    fn tar_encoding_is_deterministic_and_lossless() {
        let a = TarTransport::encode(&sample()).unwrap();
        let b = TarTransport::encode(&sample()).unwrap();
        assert_eq!(a, b);
        assert_eq!(TarTransport::decode(&a).unwrap(), sample());
    }

    #[test]
    fn garbage_is_not_a_tar() {
        let err = TarTransport::decode(&[1u8; 700]).unwrap_err();
        assert!(matches!(err, BundleError::Archive { .. }));
    }

    #[test]
    fn oversized_header_does_not_preallocate() {
        let mut header = tar::Header::new_gnu();
        header.set_path("big.bin").unwrap();
        header.set_size(1 << 40);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 1024]);

        match TarTransport::decode(&bytes) {
            Ok(files) => assert!(files.get("big.bin").map_or(true, |b| b.len() <= 1024)),
            Err(err) => assert!(matches!(err, BundleError::Archive { .. })),
        }
    }

    #[tokio::test]
    async fn memory_transport_returns_what_was_packed() {
        let transport = MemoryTransport::new();
        assert!(transport.unpack().await.is_err());
        transport.pack(&sample()).await.unwrap();
        assert_eq!(transport.unpack().await.unwrap(), sample());
    }
}
