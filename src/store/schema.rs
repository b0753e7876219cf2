use serde::{Deserialize, Serialize};

use crate::session::result::TestSummary;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestHistoryData {
    pub schema_version: u32,
    pub results: Vec<TestSummary>,
}

impl Default for TestHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            results: Vec::new(),
        }
    }
}

impl TestHistoryData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
