//! Zip backend for [`ArchiveBuilder`].

use std::io::{Cursor, Write};
use std::path::Path;

use async_trait::async_trait;
use tracing::info;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{collect_entries, ArchiveBuilder, ArchiveEntry, ArchiveError, ArchiveResult};
use crate::domain::DeployManifest;

/// Builds deflate-compressed zip archives in memory.
///
/// Filesystem reads and compression run on tokio's blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiveBuilder {
    compression: CompressionMethod,
}

impl Default for ZipArchiveBuilder {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ZipArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different compression method (e.g. `Stored`).
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }
}

#[async_trait]
impl ArchiveBuilder for ZipArchiveBuilder {
    async fn build(
        &self,
        project_root: &Path,
        manifest: &DeployManifest,
        node_env: &str,
    ) -> ArchiveResult<Vec<u8>> {
        let project_root = project_root.to_path_buf();
        let manifest = manifest.clone();
        let node_env = node_env.to_string();
        let compression = self.compression;
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let entries = collect_entries(&project_root, &manifest, &node_env)?;
            let bytes = write_zip(&entries, compression)?;
            info!(entries = entries.len(), bytes = bytes.len(), "Creating .zip file buffer completed");
            Ok(bytes)
        })
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
    }
}

/// Write entries, in order, into a finished zip buffer.
pub fn write_zip(entries: &[ArchiveEntry], compression: CompressionMethod) -> ArchiveResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(compression)
        .unix_permissions(0o644);

    for entry in entries {
        writer.start_file(entry.path.as_str(), options)?;
        writer.write_all(&entry.content).map_err(ZipError::from)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
