pub mod batch;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use batch::BatchConfig;

pub const SETTINGS_PATH: &str = "config/settings.toml";
const ENV_PREFIX: &str = "PAPERSUM";
const API_KEY_PLACEHOLDER: &str = "your-api-key";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Unpaywall 要求提供联系邮箱
    pub contact_email: String,
    pub unpaywall_url: String,
    pub semantic_scholar_url: String,
    pub timeout_secs: u64,
    pub proxy: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub proxy: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub database_path: String,
    pub output_dir: String,
    pub temp_dir: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(SETTINGS_PATH)
    }

    /// 默认值 < 配置文件 < 环境变量（PAPERSUM_SUMMARIZER__API_KEY 形式）
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let defaults = toml::to_string(&AppConfig::default())?;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(&defaults, config::FileFormat::Toml))
            .add_source(
                config::File::from(path.as_ref().to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("读取配置失败: {}", path.as_ref().display()))?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        if !app_config.summarizer.is_configured() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                app_config.summarizer.api_key = key;
            }
        }

        Ok(app_config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl SummarizerConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != API_KEY_PLACEHOLDER
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn temp_dir(&self) -> PathBuf {
        PathBuf::from(&self.temp_dir)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "papersum/0.1 (academic research)".to_string(),
            contact_email: "your@email.com".to_string(),
            unpaywall_url: "https://api.unpaywall.org/v2/".to_string(),
            semantic_scholar_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            timeout_secs: 60,
            proxy: String::new(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.5,
            max_tokens: 500,
            timeout_secs: 60,
            proxy: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./output/summaries.db".to_string(),
            output_dir: "output".to_string(),
            temp_dir: "output/tmp".to_string(),
        }
    }
}
