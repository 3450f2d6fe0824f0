//! Blob-per-article content storage.
//!
//! Article bodies can be large and are only read when an article is opened,
//! so they live outside SQLite: one file per article id under a content
//! directory. Metadata rows and blobs are kept in step by the article manager.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Storage for article bodies, addressed by article id.
pub trait ContentStore {
    fn put(&self, id: &str, content: &str) -> io::Result<()>;
    /// `Ok(None)` when no blob exists for `id`.
    fn get(&self, id: &str) -> io::Result<Option<String>>;
    /// Removing a blob that does not exist is not an error.
    fn delete(&self, id: &str) -> io::Result<()>;
}

/// File-system content store: `<root>/<id>.md`.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Creates the store, creating `root` if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: &str) -> io::Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid content id: {:?}", id),
            ));
        }
        Ok(self.root.join(format!("{}.md", id)))
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, id: &str, content: &str) -> io::Result<()> {
        let path = self.path_for(id)?;
        // Write-then-rename so a crash never leaves a truncated blob behind.
        let tmp = path.with_extension("md.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        debug!(id, bytes = content.len(), "stored article content");
        Ok(())
    }

    fn get(&self, id: &str) -> io::Result<Option<String>> {
        let path = self.path_for(id)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&self, id: &str) -> io::Result<()> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
