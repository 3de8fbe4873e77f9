pub mod semantic_scholar;
pub mod unpaywall;

pub use semantic_scholar::SemanticScholarClient;
pub use unpaywall::UnpaywallClient;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::FetchConfig;
use crate::utils::{PaperError, PaperResult};

/// 开放获取PDF的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccessPdf {
    pub pdf_url: String,
    pub source: Option<String>,
    pub oa_status: Option<String>,
}

/// 书目元数据，字段缺失时为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicMetadata {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub authors: Vec<String>,
}

/// 检索结果中的一篇论文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
}

/// 流水线依赖的远程服务
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn lookup_open_access(&self, doi: &str) -> PaperResult<Option<OpenAccessPdf>>;

    async fn download_pdf(&self, url: &str, save_path: &Path) -> PaperResult<()>;

    async fn fetch_metadata(&self, doi: &str) -> PaperResult<BibliographicMetadata>;
}

pub fn build_client(config: &FetchConfig) -> PaperResult<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str());

    if !config.proxy.is_empty() {
        match reqwest::Proxy::all(&config.proxy) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!("代理配置无效 '{}': {}", config.proxy, e),
        }
    }

    builder
        .build()
        .map_err(|e| PaperError::Config(format!("无法创建HTTP客户端: {}", e)))
}

/// Unpaywall 负责开放获取查询，Semantic Scholar 负责元数据
pub struct RemoteSources {
    client: Client,
    unpaywall: UnpaywallClient,
    scholar: SemanticScholarClient,
}

impl RemoteSources {
    pub fn new(config: &FetchConfig) -> PaperResult<Self> {
        let client = build_client(config)?;
        Ok(Self {
            unpaywall: UnpaywallClient::new(client.clone(), config),
            scholar: SemanticScholarClient::new(client.clone(), config),
            client,
        })
    }
}

#[async_trait]
impl PaperSource for RemoteSources {
    async fn lookup_open_access(&self, doi: &str) -> PaperResult<Option<OpenAccessPdf>> {
        self.unpaywall.lookup(doi).await
    }

    async fn download_pdf(&self, url: &str, save_path: &Path) -> PaperResult<()> {
        download_pdf(&self.client, url, save_path).await
    }

    async fn fetch_metadata(&self, doi: &str) -> PaperResult<BibliographicMetadata> {
        self.scholar.fetch_metadata(doi).await
    }
}

pub async fn download_pdf(client: &Client, url: &str, save_path: &Path) -> PaperResult<()> {
    info!("下载PDF: {} -> {}", url, save_path.display());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PaperError::remote("download", e))?;

    if !response.status().is_success() {
        error!("下载失败，状态码: {}", response.status());
        return Err(PaperError::remote(
            "download",
            format!("{} 返回 {}", url, response.status()),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PaperError::remote("download", e))?;

    if !looks_like_pdf(&bytes) {
        return Err(PaperError::remote(
            "download",
            format!("{} 返回的不是PDF", url),
        ));
    }

    if let Some(parent) = save_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(save_path, &bytes).await?;

    info!("PDF下载完成: {} ({} 字节)", save_path.display(), bytes.len());
    Ok(())
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
