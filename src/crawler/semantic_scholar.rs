use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{BibliographicMetadata, SearchHit};
use crate::config::FetchConfig;
use crate::utils::{PaperError, PaperResult};

const SEARCH_FIELDS: &str = "title,authors,year,externalIds,abstract,openAccessPdf";
const METADATA_FIELDS: &str = "title,year,journal,authors";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    title: Option<String>,
    year: Option<i32>,
    #[serde(default)]
    authors: Vec<S2Author>,
    journal: Option<S2Journal>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    external_ids: Option<S2ExternalIds>,
    open_access_pdf: Option<S2OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Journal {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

impl S2Paper {
    fn author_names(&self) -> Vec<String> {
        self.authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl From<S2Paper> for BibliographicMetadata {
    fn from(paper: S2Paper) -> Self {
        let authors = paper.author_names();
        Self {
            title: paper.title,
            year: paper.year,
            journal: paper
                .journal
                .and_then(|j| j.name)
                .filter(|name| !name.trim().is_empty()),
            authors,
        }
    }
}

impl From<S2Paper> for SearchHit {
    fn from(paper: S2Paper) -> Self {
        let authors = paper.author_names();
        Self {
            title: paper.title,
            authors,
            year: paper.year,
            doi: paper.external_ids.and_then(|ids| ids.doi),
            abstract_text: paper.abstract_text,
            pdf_url: paper.open_access_pdf.and_then(|pdf| pdf.url),
        }
    }
}

pub struct SemanticScholarClient {
    client: Client,
    base_url: String,
}

impl SemanticScholarClient {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            base_url: config.semantic_scholar_url.trim_end_matches('/').to_string(),
        }
    }

    /// 按关键词检索论文
    pub async fn search(&self, query: &str, limit: usize) -> PaperResult<Vec<SearchHit>> {
        let url = format!("{}/paper/search", self.base_url);
        info!("正在搜索 Semantic Scholar: {}", query);

        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await
            .map_err(|e| PaperError::remote("semantic_scholar", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperError::remote(
                "semantic_scholar",
                format!("状态码 {}", status),
            ));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| PaperError::remote("semantic_scholar", e))?;

        let hits: Vec<SearchHit> = data.data.into_iter().map(SearchHit::from).collect();
        info!("找到 {} 篇论文", hits.len());
        Ok(hits)
    }

    /// 获取 DOI 对应的标题、年份、期刊和作者
    pub async fn fetch_metadata(&self, doi: &str) -> PaperResult<BibliographicMetadata> {
        let url = format!("{}/paper/DOI:{}", self.base_url, doi);
        info!("获取元数据: {}", doi);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", METADATA_FIELDS)])
            .send()
            .await
            .map_err(|e| PaperError::remote("semantic_scholar", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperError::remote(
                "semantic_scholar",
                format!("状态码 {}", status),
            ));
        }

        let paper: S2Paper = response
            .json()
            .await
            .map_err(|e| PaperError::remote("semantic_scholar", e))?;

        Ok(paper.into())
    }
}
