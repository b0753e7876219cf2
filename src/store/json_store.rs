use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::session::result::TestSummary;
use crate::store::schema::TestHistoryData;

const HISTORY_FILE: &str = "test_history.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prepai");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(file = %path.display(), error = %e, "unreadable store file, starting fresh");
                T::default()
            }),
            Err(_) => T::default(),
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Stale schema versions load as an empty history.
    pub fn load_history(&self) -> TestHistoryData {
        let data: TestHistoryData = self.load(HISTORY_FILE);
        if data.needs_reset() {
            warn!(
                found = data.schema_version,
                "test history schema changed, starting fresh"
            );
            return TestHistoryData::default();
        }
        data
    }

    pub fn save_history(&self, data: &TestHistoryData) -> Result<()> {
        self.save(HISTORY_FILE, data)
    }

    pub fn append_result(&self, summary: &TestSummary) -> Result<()> {
        let mut history = self.load_history();
        history.results.push(summary.clone());
        self.save_history(&history)
    }
}
