pub mod pdf_parser;
pub mod section_extractor;

pub use pdf_parser::{DocumentLoader, PdfParser};
pub use section_extractor::SectionExtractor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 论文章节标签，声明顺序即输出顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 5] = [
        SectionLabel::Abstract,
        SectionLabel::Introduction,
        SectionLabel::Methods,
        SectionLabel::Results,
        SectionLabel::Discussion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::Abstract => "abstract",
            SectionLabel::Introduction => "introduction",
            SectionLabel::Methods => "methods",
            SectionLabel::Results => "results",
            SectionLabel::Discussion => "discussion",
        }
    }

    /// 标题匹配模式（大小写不敏感，由调用方加 `(?i)`）
    pub fn heading_pattern(&self) -> &'static str {
        match self {
            SectionLabel::Abstract => r"abstract",
            SectionLabel::Introduction => r"introduction",
            SectionLabel::Methods => r"methods|methodology|materials and methods",
            SectionLabel::Results => r"results",
            SectionLabel::Discussion => r"discussion|conclusion|summary",
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每个标签恰好一项，未找到的章节为空字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    sections: BTreeMap<SectionLabel, String>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self {
            sections: SectionLabel::ALL
                .iter()
                .map(|&label| (label, String::new()))
                .collect(),
        }
    }

    pub fn set(&mut self, label: SectionLabel, text: String) {
        self.sections.insert(label, text);
    }

    pub fn get(&self, label: SectionLabel) -> &str {
        self.sections.get(&label).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionLabel, &str)> {
        self.sections.iter().map(|(label, text)| (*label, text.as_str()))
    }

    /// 去除空白后非空的章节
    pub fn non_empty(&self) -> impl Iterator<Item = (SectionLabel, &str)> {
        self.iter().filter(|(_, text)| !text.trim().is_empty())
    }
}

impl Default for SectionMap {
    fn default() -> Self {
        Self::new()
    }
}

/// 章节摘要，只包含摘要成功的章节
pub type SummaryMap = BTreeMap<SectionLabel, String>;
