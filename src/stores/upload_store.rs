use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::config::UploadConfig;
use crate::utils::time::{is_expired, system_time_secs};

/// Flat directory of raw uploaded files
pub struct UploadStore {
    dir: PathBuf,
    retention_secs: Option<u64>,
    max_total_bytes: Option<u64>,
}

/// Outcome of a retention sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed_files: usize,
    pub removed_bytes: u64,
    pub remaining_bytes: u64,
}

struct StoredFile {
    path: PathBuf,
    len: u64,
    modified: i64,
}

/// Reduce a client-supplied name to its final path component
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        "upload".to_string()
    } else {
        last.to_string()
    }
}

impl UploadStore {
    pub fn new(dir: PathBuf, retention_secs: Option<u64>, max_total_bytes: Option<u64>) -> Self {
        Self {
            dir,
            retention_secs,
            max_total_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.dir.clone(),
            config.retention_secs,
            config.max_total_bytes,
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Write an upload as `<millis>-<name>`. A numeric suffix is inserted
    /// after the timestamp when that name is already taken.
    pub async fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
        timestamp_millis: i64,
    ) -> std::io::Result<PathBuf> {
        self.ensure_dir().await?;
        let name = sanitize_file_name(original_name);

        let mut attempt: u32 = 0;
        loop {
            let file_name = if attempt == 0 {
                format!("{}-{}", timestamp_millis, name)
            } else {
                format!("{}-{}-{}", timestamp_millis, attempt, name)
            };
            let path = self.dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        fs::remove_file(path).await
    }

    async fn list(&self) -> std::io::Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map(system_time_secs).unwrap_or(0);
            files.push(StoredFile {
                path: entry.path(),
                len: metadata.len(),
                modified,
            });
        }

        Ok(files)
    }

    /// Apply the retention policy: drop expired files, then the oldest
    /// files until the directory fits under the size cap.
    pub async fn sweep(&self, now_secs: i64) -> std::io::Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut files = self.list().await?;

        if let Some(ttl) = self.retention_secs {
            let ttl = i64::try_from(ttl).unwrap_or(i64::MAX);
            let mut kept = Vec::with_capacity(files.len());
            for file in files {
                if is_expired(file.modified, ttl, now_secs) {
                    self.remove_counted(&file, &mut report).await;
                } else {
                    kept.push(file);
                }
            }
            files = kept;
        }

        let mut total: u64 = files.iter().map(|f| f.len).sum();

        if let Some(cap) = self.max_total_bytes {
            files.sort_by_key(|f| f.modified);
            for file in &files {
                if total <= cap {
                    break;
                }
                if self.remove_counted(file, &mut report).await {
                    total -= file.len;
                }
            }
        }

        report.remaining_bytes = total;
        Ok(report)
    }

    async fn remove_counted(&self, file: &StoredFile, report: &mut SweepReport) -> bool {
        match fs::remove_file(&file.path).await {
            Ok(()) => {
                debug!(path = %file.path.display(), bytes = file.len, "Removed stored upload");
                report.removed_files += 1;
                report.removed_bytes += file.len;
                true
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Failed to remove stored upload");
                false
            }
        }
    }
}
