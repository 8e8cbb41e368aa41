//! Named byte streams making up a bundle.
//!
//! [`BundleFiles`] is what the bundle codec produces and consumes and what
//! archive transports pack and unpack. Paths always use `/` separators and
//! are relative to the bundle root.

use std::collections::BTreeMap;

/// Prefix under which per-object payload folders live.
pub const ASSETS_DIR: &str = "assets";

/// An ordered set of named byte streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleFiles {
    files: BTreeMap<String, Vec<u8>>,
}

impl BundleFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a stream. Leading `./` and `/` are stripped and
    /// backslashes are normalized to `/`.
    pub fn insert(&mut self, path: impl AsRef<str>, bytes: Vec<u8>) {
        self.files.insert(normalize_path(path.as_ref()), bytes);
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&normalize_path(path)).map(Vec::as_slice)
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(&normalize_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate `(path, bytes)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Group every stream under `assets/<folder>/...` by folder.
    ///
    /// Inner maps are keyed by the path relative to the folder. Streams sitting
    /// directly in `assets/` (no folder) are ignored.
    pub fn asset_folders(&self) -> BTreeMap<String, BTreeMap<String, Vec<u8>>> {
        let mut folders: BTreeMap<String, BTreeMap<String, Vec<u8>>> = BTreeMap::new();
        for (path, bytes) in &self.files {
            let Some((folder, relative)) = split_asset_path(path) else {
                continue;
            };
            folders
                .entry(folder.to_owned())
                .or_default()
                .insert(relative.to_owned(), bytes.clone());
        }
        folders
    }

    /// BLAKE3 hex digest over every path and its bytes, in path order.
    ///
    /// Two bundles with the same digest are byte-identical.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (path, bytes) in &self.files {
            hasher.update(&(path.len() as u64).to_le_bytes());
            hasher.update(path.as_bytes());
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl FromIterator<(String, Vec<u8>)> for BundleFiles {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        let mut files = BundleFiles::new();
        for (path, bytes) in iter {
            files.insert(path, bytes);
        }
        files
    }
}

/// Path of an asset payload file inside a bundle.
pub fn asset_path(folder: &str, relative: &str) -> String {
    format!("{ASSETS_DIR}/{folder}/{}", normalize_path(relative))
}

/// Split `assets/<folder>/<relative>` into `(folder, relative)`.
pub fn split_asset_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(ASSETS_DIR)?.strip_prefix('/')?;
    let (folder, relative) = rest.split_once('/')?;
    if folder.is_empty() || relative.is_empty() {
        return None;
    }
    Some((folder, relative))
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut trimmed = path.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_owned()
}
