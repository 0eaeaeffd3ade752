//! Deploy archive construction.
//!
//! Turns a manifest of project-relative paths into archive entries and
//! hands them to a backend that writes the final buffer:
//!
//! - [`collect_entries`] resolves the manifest against the project root and
//!   appends the synthesized `.env` entry. It is backend-independent.
//! - [`ArchiveBuilder`] is the swappable backend seam; [`ZipArchiveBuilder`]
//!   is the zip implementation used for Lambda deploys.

pub mod zipfile;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::domain::DeployManifest;

pub use zipfile::ZipArchiveBuilder;

/// Logical path of the synthesized environment descriptor.
pub const ENV_DESCRIPTOR_PATH: &str = ".env";

/// Result type for archive operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Errors raised while building an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("manifest entry does not exist: {entry}")]
    MissingManifestEntry { entry: String },

    #[error("invalid manifest entry {entry:?}: {reason}")]
    InvalidEntry { entry: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive task failed: {0}")]
    Task(String),
}

/// One file inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated path inside the archive
    pub path: String,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    /// The `.env` entry carrying `NODE_ENV=<value>`.
    pub fn env_descriptor(node_env: &str) -> Self {
        Self {
            path: ENV_DESCRIPTOR_PATH.to_string(),
            content: format!("NODE_ENV={}", node_env).into_bytes(),
        }
    }
}

/// Builds a finished archive buffer from a manifest.
///
/// Implementations return the complete buffer or an error; no partial
/// archive ever reaches the caller.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    async fn build(
        &self,
        project_root: &Path,
        manifest: &DeployManifest,
        node_env: &str,
    ) -> ArchiveResult<Vec<u8>>;
}

/// SHA-256 hex digest of a finished archive.
pub fn archive_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Entries keyed by logical path, kept in insertion order.
#[derive(Default)]
struct EntrySet {
    entries: Vec<ArchiveEntry>,
    index: HashMap<String, usize>,
}

impl EntrySet {
    fn insert(&mut self, entry: ArchiveEntry) {
        match self.index.get(&entry.path) {
            Some(&i) => {
                debug!(path = %entry.path, "Replacing earlier archive entry with same path");
                self.entries[i] = entry;
            }
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Drop any manifest-derived `.env` and append the synthesized one last.
    fn finish(mut self, env: ArchiveEntry) -> Vec<ArchiveEntry> {
        if self.index.contains_key(&env.path) {
            debug!(path = %env.path, "Synthesized entry overrides manifest entry");
            self.entries.retain(|e| e.path != env.path);
        }
        self.entries.push(env);
        self.entries
    }
}

/// Resolve a manifest into archive entries.
///
/// Entries are processed in manifest order. A regular file keeps its
/// relative path; a directory contributes every file beneath it, prefixed by
/// the directory's relative path. Anything else (sockets, dangling links)
/// is skipped and logged. A missing entry aborts the whole build.
pub fn collect_entries(
    project_root: &Path,
    manifest: &DeployManifest,
    node_env: &str,
) -> ArchiveResult<Vec<ArchiveEntry>> {
    info!(
        count = manifest.len(),
        files_and_directories = ?manifest.entries(),
        "Creating .zip file buffer"
    );

    let mut set = EntrySet::default();
    for entry in manifest.iter() {
        debug!(file_or_directory = %entry, "Adding file or directory to .zip buffer");

        let logical = logical_path(entry)?;
        let local = project_root.join(entry);

        let link_meta = match std::fs::symlink_metadata(&local) {
            Ok(meta) => meta,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                error!(file_or_directory = %entry, "File or directory does not exist");
                return Err(ArchiveError::MissingManifestEntry {
                    entry: entry.clone(),
                });
            }
            Err(source) => return Err(ArchiveError::Io { path: local, source }),
        };

        let meta = match std::fs::metadata(&local) {
            Ok(meta) => meta,
            Err(_) if link_meta.file_type().is_symlink() => {
                info!(file_or_directory = %entry, "Skipping dangling symlink");
                continue;
            }
            Err(source) => return Err(ArchiveError::Io { path: local, source }),
        };

        if meta.is_file() {
            let content = read_file(&local)?;
            set.insert(ArchiveEntry {
                path: logical,
                content,
            });
        } else if meta.is_dir() {
            add_directory(&local, &logical, &mut set)?;
        } else {
            info!(file_or_directory = %entry, "Skipping file or directory");
        }
    }

    debug!("Adding .env file to .zip buffer");
    let entries = set.finish(ArchiveEntry::env_descriptor(node_env));
    debug!(entries = entries.len(), "Done adding files to .zip");
    Ok(entries)
}

fn add_directory(dir: &Path, prefix: &str, set: &mut EntrySet) -> ArchiveResult<()> {
    for item in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                if is_unresolvable_link(&err) {
                    info!(path = ?err.path(), "Skipping dangling symlink");
                    continue;
                }
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf());
                return Err(ArchiveError::Io {
                    path,
                    source: err.into(),
                });
            }
        };

        let file_type = item.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            info!(path = ?item.path(), "Skipping file or directory");
            continue;
        }

        let relative = item.path().strip_prefix(dir).unwrap_or(item.path());
        let relative = join_components(relative);
        let path = if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        };

        let content = read_file(item.path())?;
        set.insert(ArchiveEntry { path, content });
    }
    Ok(())
}

/// A walk error caused by a link whose target cannot be resolved: missing,
/// self-referencing, or looping back to an ancestor.
fn is_unresolvable_link(err: &walkdir::Error) -> bool {
    if err.loop_ancestor().is_some() {
        return true;
    }
    err.path()
        .and_then(|p| std::fs::symlink_metadata(p).ok())
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

fn read_file(path: &Path) -> ArchiveResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Archive path for a manifest entry: `.` components dropped, `/`-joined.
///
/// An entry sitting at the project root gets an empty directory component,
/// so `./index.js` becomes `index.js`.
fn logical_path(entry: &str) -> ArchiveResult<String> {
    let path = Path::new(entry);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::InvalidEntry {
                    entry: entry.to_string(),
                    reason: "must be relative to the project root and must not contain '..'"
                        .to_string(),
                });
            }
        }
    }
    Ok(join_components(path))
}

fn join_components(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
