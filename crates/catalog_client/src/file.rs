//! JSON-lines file sink.
//!
//! Each emitted proposal becomes one line. The file is an append-only log,
//! not a catalog: upsert semantics apply when the log is replayed into a
//! real emitter with [`replay`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use catalog_types::ChangeProposal;

use crate::{Emitter, Result};

pub struct FileEmitter {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileEmitter {
    /// Opens `path` for appending, creating it if needed.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Emitter for FileEmitter {
    async fn emit(&self, proposal: &ChangeProposal) -> Result<()> {
        let mut line = serde_json::to_string(proposal)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(
            path = %self.path.display(),
            urn = %proposal.entity_urn,
            aspect = proposal.aspect_name(),
            "appended proposal"
        );
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.sync_all().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Read back every proposal written by a [`FileEmitter`]. Blank lines are skipped.
///
/// The log may have been edited by hand, so each line is checked for a
/// consistent urn, entity type and aspect before it is returned.
pub async fn read_proposals(path: impl AsRef<Path>) -> Result<Vec<ChangeProposal>> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<ChangeProposal> {
    let proposal: ChangeProposal = serde_json::from_str(line)?;
    proposal.validate()?;
    Ok(proposal)
}

/// Submit a captured log to `emitter` in file order, stopping at the first
/// failure. Returns the number of proposals submitted.
pub async fn replay(path: impl AsRef<Path>, emitter: &dyn Emitter) -> Result<usize> {
    let proposals = read_proposals(path.as_ref()).await?;
    for proposal in &proposals {
        emitter.emit(proposal).await?;
    }
    emitter.flush().await?;

    info!(
        count = proposals.len(),
        from = %path.as_ref().display(),
        to = %emitter.describe(),
        "replayed proposals"
    );
    Ok(proposals.len())
}
