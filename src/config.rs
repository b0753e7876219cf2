use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::controller::TestConfig;
use crate::engine::tier::DifficultyTier;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Template,
    Ollama,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub starting_tier: DifficultyTier,
    #[serde(default = "default_time_limit_minutes")]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub generator: GeneratorKind,
    #[serde(default)]
    pub problem_bank_path: Option<String>,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "default_ollama_timeout_secs")]
    pub ollama_timeout_secs: u64,
    #[serde(default = "default_save_history")]
    pub save_history: bool,
}

fn default_question_count() -> usize {
    12
}
fn default_time_limit_minutes() -> u32 {
    45
}
fn default_ollama_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_ollama_timeout_secs() -> u64 {
    30
}
fn default_save_history() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            starting_tier: DifficultyTier::default(),
            time_limit_minutes: default_time_limit_minutes(),
            generator: GeneratorKind::default(),
            problem_bank_path: None,
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            ollama_timeout_secs: default_ollama_timeout_secs(),
            save_history: default_save_history(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prepai")
            .join("config.toml")
    }

    /// Clamp values loaded from disk or the command line into usable ranges.
    pub fn validate(&mut self) {
        self.question_count = self.question_count.clamp(1, 100);
        self.time_limit_minutes = self.time_limit_minutes.clamp(1, 240);
        self.ollama_timeout_secs = self.ollama_timeout_secs.clamp(1, 300);
        if self.ollama_model.trim().is_empty() {
            self.ollama_model = default_ollama_model();
        }
    }

    pub fn test_config(&self) -> TestConfig {
        TestConfig {
            question_count: self.question_count,
            starting_tier: self.starting_tier,
            time_limit_minutes: self.time_limit_minutes,
        }
    }
}
