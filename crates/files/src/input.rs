//! Archive input model.
//!
//! A compression request is made of either local files (bytes the client can
//! read itself) or remote references (URLs only the server can fetch). The
//! two are never mixed: [`FileSet`] makes a heterogeneous list
//! unrepresentable.

use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Anything with a display name and a size in bytes.
pub trait FileDescriptor {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
}

/// Where the bytes of a [`LocalFile`] live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    /// A file on the local filesystem, read lazily.
    Path(PathBuf),
    /// Bytes already held in memory.
    Memory(Arc<[u8]>),
}

/// A file the client can read by itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    size: u64,
    source: FileSource,
}
impl LocalFile {
    /// Describe a file on disk, taking its name and size from the filesystem.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dossier_files::LocalFile;
    ///
    /// # async fn example() -> dossier_files::error::Result<()> {
    /// let file = LocalFile::from_path("/srv/expedientes/123/demanda.pdf").await?;
    /// assert_eq!(file.name(), "demanda.pdf");
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotAFile(path.to_path_buf()));
        }
        let name = path.file_name().map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy()).into_owned();
        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Describe bytes held in memory under the given display name.
    pub fn in_memory(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: FileSource::Memory(data.into()),
        }
    }

    /// Display name (not necessarily safe to use as a filesystem name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes, as known when the file was described.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Where the bytes live, for callers that stream them instead of reading
    /// them whole.
    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Read the whole file into memory.
    ///
    /// Fails with [`NotFound`](ErrorKind::NotFound) when a path-backed file
    /// has disappeared since it was described.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Memory(data) => Ok(data.to_vec()),
            FileSource::Path(path) => {
                let data = tokio::fs::read(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
                tracing::trace!(path = %path.display(), size = data.len(), "Read local file");
                Ok(data)
            },
        }
    }
}
impl FileDescriptor for LocalFile {
    fn name(&self) -> &str {
        LocalFile::name(self)
    }

    fn size(&self) -> u64 {
        LocalFile::size(self)
    }
}

/// A URL the server fetches on the client's behalf.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteRef(String);
impl RemoteRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for RemoteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl From<&str> for RemoteRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<String> for RemoteRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The inputs of one compression request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSet {
    Local(Vec<LocalFile>),
    Remote(Vec<RemoteRef>),
}
impl FileSet {
    pub fn len(&self) -> usize {
        match self {
            Self::Local(files) => files.len(),
            Self::Remote(refs) => refs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate size of local files; remote references have no known size.
    pub fn total_size(&self) -> u64 {
        match self {
            Self::Local(files) => crate::calculate_total_size(files),
            Self::Remote(_) => 0,
        }
    }
}
impl From<Vec<LocalFile>> for FileSet {
    fn from(value: Vec<LocalFile>) -> Self {
        Self::Local(value)
    }
}
impl From<Vec<RemoteRef>> for FileSet {
    fn from(value: Vec<RemoteRef>) -> Self {
        Self::Remote(value)
    }
}
