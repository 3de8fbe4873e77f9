use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const BATCH_PATH: &str = "config/dois.toml";

/// 批量摘要时默认处理的 DOI 列表
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    pub dois: Vec<String>,
}

impl BatchConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(BATCH_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BatchConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 去掉空白项和重复项，保持原有顺序
    pub fn active_dois(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.dois
            .iter()
            .map(|doi| doi.trim())
            .filter(|doi| !doi.is_empty() && seen.insert(*doi))
            .collect()
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            dois: vec![
                "10.1038/s41586-020-2649-2".to_string(),
                "10.1126/science.abd4570".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_default_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::load_from(dir.path().join("dois.toml")).unwrap();
        assert_eq!(
            config.active_dois(),
            vec!["10.1038/s41586-020-2649-2", "10.1126/science.abd4570"]
        );
    }

    #[test]
    fn test_active_dois_skips_blank_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dois.toml");
        std::fs::write(
            &path,
            "dois = [\"10.1/a\", \"  \", \" 10.1/b \", \"10.1/a\"]\n",
        )
        .unwrap();

        let config = BatchConfig::load_from(&path).unwrap();
        assert_eq!(config.active_dois(), vec!["10.1/a", "10.1/b"]);
    }
}
