//! Data directory: hot snapshot, cold artifacts and quarantine state.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratatier::{FsColdStore, MemoryHotStore, QuarantineEntry, Tiering, TieringConfig};

const HOT_FILE: &str = "hot.jsonl";
const COLD_DIR: &str = "cold";
const QUARANTINE_FILE: &str = "quarantine.json";

/// A [`Tiering`] opened over a data directory
pub struct Session {
    dir: PathBuf,
    hot: Arc<MemoryHotStore>,
    pub tiering: Tiering,
}

impl Session {
    pub fn open(dir: impl AsRef<Path>, config: TieringConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;

        let hot = Arc::new(
            MemoryHotStore::load_jsonl(dir.join(HOT_FILE), config.max_record_size)
                .context("loading hot tier")?,
        );
        let cold = Arc::new(FsColdStore::open(dir.join(COLD_DIR)).context("opening cold tier")?);
        let tiering = Tiering::builder()
            .config(config)
            .hot(hot.clone())
            .cold(cold)
            .build()?;

        let quarantine_path = dir.join(QUARANTINE_FILE);
        if quarantine_path.exists() {
            let text = std::fs::read_to_string(&quarantine_path)
                .with_context(|| format!("reading {}", quarantine_path.display()))?;
            let entries: Vec<QuarantineEntry> = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", quarantine_path.display()))?;
            tiering.archival.restore_quarantine(entries);
        }

        Ok(Session { dir, hot, tiering })
    }

    /// Write hot records and quarantine state back to the directory
    pub fn persist(&self) -> Result<()> {
        self.hot
            .save_jsonl(self.dir.join(HOT_FILE))
            .context("saving hot tier")?;

        let path = self.dir.join(QUARANTINE_FILE);
        let tmp = self.dir.join(format!("{}.tmp", QUARANTINE_FILE));
        let text = serde_json::to_string_pretty(&self.tiering.archival.quarantined())?;
        std::fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}
