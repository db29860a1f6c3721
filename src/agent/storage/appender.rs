use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use super::record::{LogRecord, LOG_HEADER};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Appends records to the task log. The file is opened for every call and closed right after, so
/// no handle outlives a single append.
#[derive(Debug, Clone)]
pub struct LogAppender {
    path: PathBuf,
}

struct OpenedLog {
    file: File,
    created: bool,
}

impl LogAppender {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a single record, writing the header first if the file had to be created.
    ///
    /// Never waits for a lock held by another program; contention is reported as an error. A
    /// file created by a failed call is removed again so the next call writes the header.
    pub async fn append(&self, record: &LogRecord) -> Result<()> {
        let mut opened = self
            .open()
            .await
            .with_context(|| format!("Failed to open log file {:?}", self.path))?;

        let mut buffer = String::new();
        if opened.created {
            buffer.push_str(LOG_HEADER);
            buffer.push_str(LINE_ENDING);
        }
        buffer.push_str(&record.to_string());
        buffer.push_str(LINE_ENDING);

        let written = self.write_locked(&mut opened.file, buffer.as_bytes()).await;
        if let Err(e) = written {
            self.discard(opened).await;
            return Err(e);
        }
        if opened.created {
            info!("Created log file {:?}", self.path);
        }
        debug!("Appended {record}");
        Ok(())
    }

    async fn write_locked(&self, file: &mut File, buffer: &[u8]) -> Result<()> {
        file.try_lock_exclusive()
            .with_context(|| format!("Log file {:?} is locked by another program", self.path))?;
        let result = Self::write_with_file(file, buffer)
            .await
            .with_context(|| format!("Failed to write to log file {:?}", self.path));
        // Not fatal, the lock goes away with the handle.
        if let Err(e) = file.unlock_async().await {
            warn!("Failed to unlock {:?} {e:?}", self.path);
        }
        result
    }

    /// Drops the handle of a failed append and removes the file if that append created it.
    async fn discard(&self, opened: OpenedLog) {
        let OpenedLog { file, created } = opened;
        drop(file);
        if !created {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!("Failed to remove incomplete log file {:?} {e:?}", self.path);
        }
    }

    /// Creation is decided by `create_new`, so the header is written exactly once even if the
    /// file shows up between two calls.
    async fn open(&self) -> std::io::Result<OpenedLog> {
        match File::options()
            .append(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => Ok(OpenedLog {
                file,
                created: true,
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let file = File::options().append(true).open(&self.path).await?;
                Ok(OpenedLog {
                    file,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn write_with_file(file: &mut File, buffer: &[u8]) -> std::io::Result<()> {
        file.write_all(buffer).await?;
        // tokio finishes pending writes only on flush.
        file.flush().await
    }
}
