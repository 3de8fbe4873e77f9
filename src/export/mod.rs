use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::storage::PaperRecord;
use crate::utils::{safe_file_stem, PaperResult};

/// 导出文件的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}

/// 把记录导出为纯文本和 JSON 两份文件
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn paths_for(&self, identifier: &str) -> ExportPaths {
        let stem = safe_file_stem(identifier);
        ExportPaths {
            text: self.output_dir.join(format!("{}.txt", stem)),
            json: self.output_dir.join(format!("{}.json", stem)),
        }
    }

    pub async fn export(&self, record: &PaperRecord) -> PaperResult<ExportPaths> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let paths = self.paths_for(&record.identifier);
        tokio::fs::write(&paths.text, render_text(record)).await?;
        tokio::fs::write(&paths.json, render_json(record)?).await?;

        info!("已导出: {} / {}", paths.text.display(), paths.json.display());
        Ok(paths)
    }
}

pub fn render_text(record: &PaperRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "DOI: {}", record.identifier);
    if let Some(title) = &record.title {
        let _ = writeln!(out, "Title: {}", title);
    }
    if let Some(year) = record.year {
        let _ = writeln!(out, "Year: {}", year);
    }
    if let Some(journal) = &record.journal {
        let _ = writeln!(out, "Journal: {}", journal);
    }
    out.push('\n');

    for (label, summary) in &record.summaries {
        let _ = write!(
            out,
            "--- {} ---\n{}\n\n",
            label.as_str().to_uppercase(),
            summary
        );
    }

    out
}

pub fn render_json(record: &PaperRecord) -> PaperResult<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SectionLabel, SummaryMap};
    use chrono::{TimeZone, Utc};

    fn record() -> PaperRecord {
        let mut summaries = SummaryMap::new();
        summaries.insert(SectionLabel::Results, "It worked.".to_string());
        summaries.insert(SectionLabel::Abstract, "We tried a thing.".to_string());
        PaperRecord {
            identifier: "10.1038/s41586-020-2649-2".to_string(),
            title: Some("Array programming with NumPy".to_string()),
            year: Some(2020),
            journal: None,
            authors: vec!["Charles R. Harris".to_string()],
            generated_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
            summaries,
        }
    }

    #[test]
    fn test_render_text_layout() {
        let text = render_text(&record());
        assert_eq!(
            text,
            "DOI: 10.1038/s41586-020-2649-2\n\
             Title: Array programming with NumPy\n\
             Year: 2020\n\
             \n\
             --- ABSTRACT ---\nWe tried a thing.\n\n\
             --- RESULTS ---\nIt worked.\n\n"
        );
    }

    #[test]
    fn test_render_json_has_full_record() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&record()).unwrap()).unwrap();
        assert_eq!(json["identifier"], "10.1038/s41586-020-2649-2");
        assert_eq!(json["year"], 2020);
        assert!(json["journal"].is_null());
        assert_eq!(json["authors"][0], "Charles R. Harris");
        assert_eq!(json["summaries"]["abstract"], "We tried a thing.");
        assert_eq!(json["generated_at"], "2024-05-06T07:08:09Z");
    }

    #[tokio::test]
    async fn test_export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("output"));

        let paths = exporter.export(&record()).await.unwrap();
        assert_eq!(paths.text, dir.path().join("output/10.1038_s41586-020-2649-2.txt"));
        assert!(std::fs::read_to_string(&paths.text).unwrap().starts_with("DOI: "));
        assert!(std::fs::read_to_string(&paths.json).unwrap().contains("\"summaries\""));
    }
}
