use crate::error::{Error, Result};
use crate::index::Index;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

/// File header: magic followed by a little-endian u32 format version.
pub const MAGIC: &[u8; 8] = b"PGDXIDX\0";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

#[derive(Serialize)]
struct PayloadRef<'a> {
    created_at: &'a str,
    index: &'a Index,
}

#[derive(Deserialize)]
struct Payload {
    created_at: String,
    index: Index,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index_file(&self) -> PathBuf { self.root.join("index.bin") }
    fn tmp_file(&self) -> PathBuf { self.root.join("index.bin.tmp") }
}

/// What `IndexStore::load_with_info` found on disk besides the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredInfo {
    pub version: u32,
    pub created_at: String,
}

/// Owner of the on-disk index: a single file under `root`, replaced atomically.
#[derive(Debug, Clone)]
pub struct IndexStore {
    paths: IndexPaths,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { paths: IndexPaths::new(root) }
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Write to a temp file, fsync, then rename over the previous index.
    /// On failure the previous file is left as it was.
    pub fn save(&self, index: &Index) -> Result<()> {
        create_dir_all(&self.paths.root)?;
        let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let payload = bincode::serialize(&PayloadRef { created_at: &created_at, index })
            .map_err(Error::Encode)?;

        let tmp = self.paths.tmp_file();
        if let Err(e) = write_synced(&tmp, &payload) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, self.paths.index_file()) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::info!(
            path = %self.paths.index_file().display(),
            num_pages = index.num_pages(),
            bytes = payload.len() + HEADER_LEN,
            "saved index"
        );
        Ok(())
    }

    /// Missing file means nothing was indexed yet: `Index::Empty`.
    /// Anything unreadable is an error.
    pub fn load(&self) -> Result<Index> {
        Ok(self.load_with_info()?.0)
    }

    pub fn load_with_info(&self) -> Result<(Index, Option<StoredInfo>)> {
        let path = self.paths.index_file();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no stored index");
                return Ok((Index::Empty, None));
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(Error::Corrupt(format!("{} is not an index file", path.display())));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(Error::IncompatibleVersion { found: version, expected: FORMAT_VERSION });
        }

        let payload: Payload = bincode::deserialize(&bytes[HEADER_LEN..])
            .map_err(|e| Error::Corrupt(format!("{}: {e}", path.display())))?;
        payload.index.validate()?;
        tracing::info!(num_pages = payload.index.num_pages(), created_at = %payload.created_at, "loaded index");
        Ok((payload.index, Some(StoredInfo { version, created_at: payload.created_at })))
    }
}

fn write_synced(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(MAGIC)?;
    f.write_all(&FORMAT_VERSION.to_le_bytes())?;
    f.write_all(payload)?;
    f.sync_all()
}
