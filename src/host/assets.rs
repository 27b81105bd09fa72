//! Host asset filesystems
//!
//! Asset names may carry the console's `nitro:/` prefix; it is stripped and
//! the rest is resolved against the backing store.

use crate::platform::AssetFs;
use crate::streaming::AssetReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Prefix used by packaged asset paths
pub const ASSET_PREFIX: &str = "nitro:/";

fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(ASSET_PREFIX)
        .unwrap_or(name)
        .trim_start_matches('/')
}

/// Assets served from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
    mounted: bool,
}

impl DirAssets {
    /// Serve assets from `root` once mounted
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirAssets {
            root: root.as_ref().to_path_buf(),
            mounted: false,
        }
    }

    /// Directory backing the filesystem
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(strip_prefix(name));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset path '{name}' escapes the asset root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetFs for DirAssets {
    fn mount(&mut self) -> io::Result<()> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("asset directory '{}' not found", self.root.display()),
            ));
        }
        self.mounted = true;
        tracing::debug!("mounted assets at {}", self.root.display());
        Ok(())
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn AssetReader>> {
        if !self.mounted {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "asset filesystem not mounted",
            ));
        }
        let file = File::open(self.resolve(name)?)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Assets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Arc<[u8]>>,
    fail_mount: bool,
}

impl MemoryAssets {
    /// Empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an asset
    pub fn insert(&mut self, name: &str, data: impl Into<Vec<u8>>) -> &mut Self {
        let data: Vec<u8> = data.into();
        self.files.insert(strip_prefix(name).to_string(), data.into());
        self
    }

    /// Builder form of [`MemoryAssets::insert`]
    pub fn with(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Make the next mount fail
    pub fn failing_mount(mut self) -> Self {
        self.fail_mount = true;
        self
    }
}

/// Shared, cheaply cloned byte buffer usable as a cursor
#[derive(Debug, Clone)]
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AssetFs for MemoryAssets {
    fn mount(&mut self) -> io::Result<()> {
        if self.fail_mount {
            return Err(io::Error::new(io::ErrorKind::Other, "mount refused"));
        }
        Ok(())
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn AssetReader>> {
        let data = self.files.get(strip_prefix(name)).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset named '{name}'"))
        })?;
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(data)))))
    }
}
