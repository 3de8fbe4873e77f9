use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::crawler::{BibliographicMetadata, PaperSource};
use crate::export::Exporter;
use crate::parser::{DocumentLoader, SectionExtractor, SummaryMap};
use crate::storage::{Database, PaperRecord};
use crate::summarizer::{Summarizer, SummaryOutcome};
use crate::utils::{safe_file_stem, PaperError, PaperResult};

/// 本地PDF的处理方式
#[derive(Debug, Clone)]
pub struct FileOptions {
    pub identifier: String,
    /// identifier 是 DOI 时才去查元数据
    pub lookup_metadata: bool,
    pub persist: bool,
}

/// 下载 → 提取 → 逐章摘要 → 入库 → 导出
pub struct Pipeline {
    sources: Box<dyn PaperSource>,
    loader: Box<dyn DocumentLoader>,
    extractor: SectionExtractor,
    summarizer: Summarizer,
    exporter: Exporter,
    db: Database,
    temp_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        sources: Box<dyn PaperSource>,
        loader: Box<dyn DocumentLoader>,
        summarizer: Summarizer,
        exporter: Exporter,
        db: Database,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sources,
            loader,
            extractor: SectionExtractor::new(),
            summarizer,
            exporter,
            db,
            temp_dir: temp_dir.into(),
        }
    }

    /// 通过开放获取渠道下载 DOI 对应的PDF并生成摘要
    pub async fn summarize_doi(&self, doi: &str) -> PaperResult<PaperRecord> {
        info!("处理 DOI: {}", doi);

        let oa = self
            .sources
            .lookup_open_access(doi)
            .await?
            .ok_or_else(|| PaperError::NoOpenAccess(doi.to_string()))?;
        info!(
            "开放获取PDF: {} (来源: {}, 状态: {})",
            oa.pdf_url,
            oa.source.as_deref().unwrap_or("-"),
            oa.oa_status.as_deref().unwrap_or("-")
        );

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let pdf_path = self
            .temp_dir
            .join(format!("temp_{}.pdf", safe_file_stem(doi)));

        if let Err(e) = self.sources.download_pdf(&oa.pdf_url, &pdf_path).await {
            remove_temp_file(&pdf_path).await;
            return Err(e);
        }

        let loaded = self.loader.load(&pdf_path);
        remove_temp_file(&pdf_path).await;
        let full_text = loaded?;

        let summaries = self.summarize_text(doi, &full_text).await?;
        let metadata = self.lookup_metadata(doi).await;

        self.finish(PaperRecord::new(doi, metadata, summaries), true)
            .await
    }

    /// 处理本地PDF文件
    pub async fn summarize_file(&self, path: &Path, options: &FileOptions) -> PaperResult<PaperRecord> {
        info!("处理本地PDF: {} ({})", path.display(), options.identifier);

        let full_text = self.loader.load(path)?;
        let summaries = self.summarize_text(&options.identifier, &full_text).await?;

        let metadata = if options.lookup_metadata {
            self.lookup_metadata(&options.identifier).await
        } else {
            BibliographicMetadata::default()
        };

        self.finish(
            PaperRecord::new(&options.identifier, metadata, summaries),
            options.persist,
        )
        .await
    }

    /// 切分章节并逐个摘要；没有任何成功摘要时中止
    pub async fn summarize_text(&self, identifier: &str, full_text: &str) -> PaperResult<SummaryMap> {
        let sections = self.extractor.extract(full_text);

        let mut summaries = SummaryMap::new();
        for (label, text) in sections.non_empty() {
            match self.summarizer.summarize(label, text).await {
                SummaryOutcome::Summarized(summary) => {
                    info!("--- {} ---\n{}", label.as_str().to_uppercase(), summary);
                    summaries.insert(label, summary);
                }
                SummaryOutcome::Failed(reason) => {
                    warn!("跳过章节 [{}]: {}", label, reason);
                }
            }
        }

        if summaries.is_empty() {
            return Err(PaperError::NoSummaries(identifier.to_string()));
        }

        info!("{} 共生成 {} 个章节摘要", identifier, summaries.len());
        Ok(summaries)
    }

    async fn lookup_metadata(&self, doi: &str) -> BibliographicMetadata {
        match self.sources.fetch_metadata(doi).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("元数据获取失败，继续处理: {}", e);
                BibliographicMetadata::default()
            }
        }
    }

    /// 先入库，再导出；导出与入库结果无关，入库失败在导出之后返回
    async fn finish(&self, record: PaperRecord, persist: bool) -> PaperResult<PaperRecord> {
        let stored = if persist {
            self.db.upsert(&record).await
        } else {
            Ok(())
        };
        if let Err(e) = &stored {
            error!("保存记录失败 {}: {}", record.identifier, e);
        }

        if let Err(e) = self.exporter.export(&record).await {
            warn!("导出文件失败 {}: {}", record.identifier, e);
        }

        stored.map(|_| record)
    }
}

async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("已删除临时文件: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("删除临时文件失败 {}: {}", path.display(), e),
    }
}
