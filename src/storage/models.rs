use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::crawler::BibliographicMetadata;
use crate::parser::SummaryMap;
use crate::utils::{PaperError, PaperResult};

/// 作者列表在数据库中的分隔符
pub const AUTHOR_DELIMITER: &str = "; ";

/// 一篇论文的摘要记录，按 identifier 整体覆盖写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub identifier: String,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub authors: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub summaries: SummaryMap,
}

impl PaperRecord {
    pub fn new(identifier: &str, metadata: BibliographicMetadata, summaries: SummaryMap) -> Self {
        Self {
            identifier: identifier.to_string(),
            title: metadata.title,
            year: metadata.year,
            journal: metadata.journal,
            authors: metadata.authors,
            generated_at: Utc::now(),
            summaries,
        }
    }

    /// 任一章节摘要包含关键词即匹配（不区分大小写）
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.summaries
            .values()
            .any(|summary| summary.to_lowercase().contains(&needle))
    }
}

/// summaries 表的一行
#[derive(Debug, Clone, FromRow)]
pub struct PaperRow {
    pub identifier: String,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub authors: Option<String>,
    pub generated_at: String,
    pub summaries_json: String,
}

impl TryFrom<&PaperRecord> for PaperRow {
    type Error = PaperError;

    fn try_from(record: &PaperRecord) -> PaperResult<Self> {
        let authors = if record.authors.is_empty() {
            None
        } else {
            Some(record.authors.join(AUTHOR_DELIMITER))
        };

        Ok(Self {
            identifier: record.identifier.clone(),
            title: record.title.clone(),
            year: record.year,
            journal: record.journal.clone(),
            authors,
            generated_at: record.generated_at.to_rfc3339(),
            summaries_json: serde_json::to_string(&record.summaries)?,
        })
    }
}

impl TryFrom<PaperRow> for PaperRecord {
    type Error = PaperError;

    fn try_from(row: PaperRow) -> PaperResult<Self> {
        let generated_at = DateTime::parse_from_rfc3339(&row.generated_at)
            .map_err(|e| {
                PaperError::Parse(format!("{} 的时间戳无效 '{}': {}", row.identifier, row.generated_at, e))
            })?
            .with_timezone(&Utc);

        let summaries: SummaryMap = serde_json::from_str(&row.summaries_json)?;

        let authors = row
            .authors
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| a.split(AUTHOR_DELIMITER).map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            identifier: row.identifier,
            title: row.title,
            year: row.year,
            journal: row.journal,
            authors,
            generated_at,
            summaries,
        })
    }
}

/// 记录查询条件，None 表示不限制
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub keyword: Option<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SectionLabel;
    use chrono::TimeZone;

    fn record() -> PaperRecord {
        let mut summaries = SummaryMap::new();
        summaries.insert(SectionLabel::Abstract, "Cells glow under light.".to_string());
        summaries.insert(SectionLabel::Results, "The GLOW doubled.".to_string());
        PaperRecord {
            identifier: "10.1/glow".to_string(),
            title: Some("Glowing cells".to_string()),
            year: Some(2021),
            journal: None,
            authors: vec!["Doe, Jane".to_string(), "Roe, Richard".to_string()],
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            summaries,
        }
    }

    #[test]
    fn test_row_conversion_keeps_every_field() {
        let original = record();
        let row = PaperRow::try_from(&original).unwrap();
        assert_eq!(row.authors.as_deref(), Some("Doe, Jane; Roe, Richard"));
        assert_eq!(row.generated_at, "2024-03-01T12:30:00+00:00");

        let back = PaperRecord::try_from(row).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_no_authors_is_stored_as_null() {
        let mut original = record();
        original.authors.clear();
        let row = PaperRow::try_from(&original).unwrap();
        assert!(row.authors.is_none());
        assert!(PaperRecord::try_from(row).unwrap().authors.is_empty());
    }

    #[test]
    fn test_bad_timestamp_is_parse_error() {
        let mut row = PaperRow::try_from(&record()).unwrap();
        row.generated_at = "yesterday".to_string();
        assert!(matches!(PaperRecord::try_from(row), Err(PaperError::Parse(_))));
    }

    #[test]
    fn test_keyword_matches_any_section_case_insensitively() {
        let r = record();
        assert!(r.matches_keyword("glow"));
        assert!(r.matches_keyword("DOUBLED"));
        assert!(!r.matches_keyword("mice"));
    }
}
