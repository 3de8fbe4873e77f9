use regex::Regex;
use std::ops::Range;
use tracing::{debug, info, warn};

use super::{SectionLabel, SectionMap};

/// 章节定位策略：给出某个标签在全文中对应的字节区间
pub trait SectionLocator: Send + Sync {
    fn locate(&self, text: &str, label: SectionLabel) -> Option<Range<usize>>;
}

/// 基于标题正则的启发式定位。
///
/// 每个标签都在整篇文本中独立搜索，取标题的第一次出现，
/// 一直截取到其后第一行"看起来像标题"的文本；找不到这样的行就截到文末。
/// 不同标签的区间可以重叠。
pub struct HeadingRegexLocator {
    headings: Vec<(SectionLabel, Regex)>,
    boundary: Regex,
}

impl HeadingRegexLocator {
    pub fn new() -> Self {
        let headings = SectionLabel::ALL
            .iter()
            .map(|&label| {
                let pattern = format!("(?i){}", label.heading_pattern());
                (label, Regex::new(&pattern).unwrap())
            })
            .collect();

        // 独立一行，3-32 个字符，大写字母开头，只含字母和空白
        let boundary = Regex::new(r"\n[A-Z][A-Za-z \t]{2,31}\r?\n").unwrap();

        Self { headings, boundary }
    }

    fn heading(&self, label: SectionLabel) -> Option<&Regex> {
        self.headings
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, re)| re)
    }
}

impl Default for HeadingRegexLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionLocator for HeadingRegexLocator {
    fn locate(&self, text: &str, label: SectionLabel) -> Option<Range<usize>> {
        let heading = self.heading(label)?.find(text)?;

        let end = self
            .boundary
            .find(&text[heading.end()..])
            .map(|b| heading.end() + b.start())
            .unwrap_or(text.len());

        debug!("章节 [{}] 区间 {}..{}", label, heading.start(), end);
        Some(heading.start()..end)
    }
}

pub struct SectionExtractor {
    locator: Box<dyn SectionLocator>,
}

impl SectionExtractor {
    pub fn new() -> Self {
        Self::with_locator(Box::new(HeadingRegexLocator::new()))
    }

    pub fn with_locator(locator: Box<dyn SectionLocator>) -> Self {
        Self { locator }
    }

    /// 从全文中切出固定的五个章节，缺失的章节为空字符串
    pub fn extract(&self, full_text: &str) -> SectionMap {
        let mut sections = SectionMap::new();

        for label in SectionLabel::ALL {
            let Some(span) = self.locator.locate(full_text, label) else {
                continue;
            };
            match full_text.get(span.clone()) {
                Some(text) => sections.set(label, text.trim().to_string()),
                None => warn!("章节 [{}] 区间无效: {:?}", label, span),
            }
        }

        let found = sections.non_empty().count();
        info!("章节提取完成: {}/{} 个非空", found, SectionLabel::ALL.len());
        sections
    }
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new()
    }
}
