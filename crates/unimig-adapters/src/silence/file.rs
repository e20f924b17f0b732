use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use unimig_core::silence::Silence;
use unimig_ports::error::PortError;
use unimig_ports::outbound::SilenceWriter;

const SILENCES_FILE: &str = "silences";

fn io(path: &Path, e: std::io::Error) -> PortError {
    PortError::Io(format!("{}: {e}", path.display()))
}

/// Keeps each org's silences as a pretty-printed JSON array of [`Silence`]
/// under `<data_dir>/alerting/<org_id>/silences`. Read back with
/// [`FileSilenceWriter::read_silences`]; importing them into an alertmanager
/// is left to the operator.
pub struct FileSilenceWriter {
    data_dir: PathBuf,
}

impl FileSilenceWriter {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn org_dir(&self, org_id: i64) -> PathBuf {
        self.data_dir.join("alerting").join(org_id.to_string())
    }

    pub fn silences_path(&self, org_id: i64) -> PathBuf {
        self.org_dir(org_id).join(SILENCES_FILE)
    }

    /// Empty when nothing was written for the org.
    pub async fn read_silences(&self, org_id: i64) -> Result<Vec<Silence>, PortError> {
        let path = self.silences_path(org_id);
        match fs::read(&path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| PortError::Io(e.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io(&path, e)),
        }
    }
}

#[async_trait]
impl SilenceWriter for FileSilenceWriter {
    async fn write_silences(&self, org_id: i64, silences: &[Silence]) -> Result<(), PortError> {
        let dir = self.org_dir(org_id);
        fs::create_dir_all(&dir).await.map_err(|e| io(&dir, e))?;

        let path = dir.join(SILENCES_FILE);
        let body = serde_json::to_vec_pretty(silences).map_err(|e| PortError::Io(e.to_string()))?;
        fs::write(&path, body).await.map_err(|e| io(&path, e))?;

        debug!(org_id, count = silences.len(), path = %path.display(), "wrote silences");
        Ok(())
    }

    async fn remove_silences(&self, org_id: i64) -> Result<(), PortError> {
        let path = self.silences_path(org_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io(&path, e)),
        }
    }
}
