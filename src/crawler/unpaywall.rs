use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::OpenAccessPdf;
use crate::config::FetchConfig;
use crate::utils::{PaperError, PaperResult};

#[derive(Debug, Deserialize)]
struct UnpaywallResponse {
    #[serde(default)]
    is_oa: bool,
    best_oa_location: Option<OaLocation>,
    oa_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url_for_pdf: Option<String>,
    host_type: Option<String>,
}

impl UnpaywallResponse {
    fn into_open_access(self) -> Option<OpenAccessPdf> {
        if !self.is_oa {
            return None;
        }
        let location = self.best_oa_location?;
        let pdf_url = location.url_for_pdf.filter(|url| !url.trim().is_empty())?;

        Some(OpenAccessPdf {
            pdf_url,
            source: location.host_type,
            oa_status: self.oa_status,
        })
    }
}

pub struct UnpaywallClient {
    client: Client,
    base_url: String,
    email: String,
}

impl UnpaywallClient {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            base_url: config.unpaywall_url.clone(),
            email: config.contact_email.clone(),
        }
    }

    /// 查询 DOI 的开放获取PDF，不可获取时返回 None
    pub async fn lookup(&self, doi: &str) -> PaperResult<Option<OpenAccessPdf>> {
        let url = format!("{}{}", self.base_url, doi);
        info!("查询 Unpaywall: {}", doi);

        let response = self
            .client
            .get(&url)
            .query(&[("email", self.email.as_str())])
            .send()
            .await
            .map_err(|e| PaperError::remote("unpaywall", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperError::remote("unpaywall", format!("状态码 {}", status)));
        }

        let data: UnpaywallResponse = response
            .json()
            .await
            .map_err(|e| PaperError::remote("unpaywall", e))?;

        let found = data.into_open_access();
        if found.is_none() {
            warn!("{} 没有开放获取PDF", doi);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<OpenAccessPdf> {
        serde_json::from_str::<UnpaywallResponse>(json)
            .unwrap()
            .into_open_access()
    }

    #[test]
    fn test_open_access_with_pdf_url() {
        let found = parse(
            r#"{
                "doi": "10.1038/s41586-020-2649-2",
                "title": "Array programming with NumPy",
                "is_oa": true,
                "oa_status": "hybrid",
                "best_oa_location": {
                    "url": "https://www.nature.com/articles/s41586-020-2649-2",
                    "url_for_pdf": "https://www.nature.com/articles/s41586-020-2649-2.pdf",
                    "host_type": "publisher"
                }
            }"#,
        );

        assert_eq!(
            found,
            Some(OpenAccessPdf {
                pdf_url: "https://www.nature.com/articles/s41586-020-2649-2.pdf".to_string(),
                source: Some("publisher".to_string()),
                oa_status: Some("hybrid".to_string()),
            })
        );
    }

    #[test]
    fn test_closed_paper_is_unavailable() {
        let found = parse(
            r#"{"is_oa": false, "oa_status": "closed", "best_oa_location": null}"#,
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_location_without_pdf_url_is_unavailable() {
        let found = parse(
            r#"{
                "is_oa": true,
                "oa_status": "green",
                "best_oa_location": {"url": "https://example.org/landing", "url_for_pdf": null, "host_type": "repository"}
            }"#,
        );
        assert!(found.is_none());
    }
}
