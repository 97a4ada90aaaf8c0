//! File-backed tree store.
//!
//! The whole list is rewritten on every append: a temp file in the same
//! directory is written, flushed and renamed over the target, so readers
//! see either the old or the new list, never a partial one.
//!
//! Layout: `[format: u8 = 0x01] [bincode(Vec<StoredTree>)]`.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{StoreError, StoredTree, TreeStore};

const FORMAT_V1: u8 = 0x01;

/// Tree store persisted to a single file.
#[derive(Debug)]
pub struct FileTreeStore {
    path: PathBuf,
    trees: Vec<StoredTree>,
}

impl FileTreeStore {
    /// Open the store at `path`, loading existing trees. A missing file is
    /// an empty store; it is created on the first append.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let trees = match fs::read(&path) {
            Ok(bytes) => decode_trees(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), trees = trees.len(), "opened tree store");
        Ok(Self { path, trees })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, trees: &[StoredTree]) -> Result<(), StoreError> {
        let bytes = encode_trees(trees)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl TreeStore for FileTreeStore {
    fn append(&mut self, tree: StoredTree) -> Result<(), StoreError> {
        self.trees.push(tree);
        if let Err(e) = self.write_all(&self.trees) {
            self.trees.pop();
            return Err(e);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredTree>, StoreError> {
        Ok(self.trees.clone())
    }

    fn size(&self) -> usize {
        self.trees.len()
    }
}

fn encode_trees(trees: &[StoredTree]) -> Result<Vec<u8>, StoreError> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_no_limit();
    let body = bincode::encode_to_vec(trees, config)
        .map_err(|e| StoreError::Encoding(format!("encode trees: {}", e)))?;
    let mut bytes = Vec::with_capacity(1 + body.len());
    bytes.push(FORMAT_V1);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn decode_trees(bytes: &[u8]) -> Result<Vec<StoredTree>, StoreError> {
    let Some((&format, body)) = bytes.split_first() else {
        return Err(StoreError::Corrupted("empty store file".into()));
    };
    if format != FORMAT_V1 {
        return Err(StoreError::Corrupted(format!(
            "unknown store format 0x{:02x}",
            format
        )));
    }
    let config = bincode::config::standard()
        .with_big_endian()
        .with_limit::<{ 100 * 1024 * 1024 }>();
    let (trees, read): (Vec<StoredTree>, usize) = bincode::decode_from_slice(body, config)
        .map_err(|e| StoreError::Corrupted(format!("decode trees: {}", e)))?;
    if read != body.len() {
        return Err(StoreError::Corrupted(format!(
            "{} trailing bytes after tree list",
            body.len() - read
        )));
    }
    Ok(trees)
}
