pub mod logger;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaperError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("PDF读取失败: {0}")]
    DocumentRead(String),

    #[error("{service} 请求失败: {reason}")]
    RemoteLookup { service: &'static str, reason: String },

    #[error("未找到开放获取PDF: {0}")]
    NoOpenAccess(String),

    #[error("摘要生成失败: {0}")]
    Generation(String),

    #[error("没有成功生成任何章节摘要: {0}")]
    NoSummaries(String),

    #[error("数据库错误: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PaperError {
    pub fn remote(service: &'static str, reason: impl std::fmt::Display) -> Self {
        PaperError::RemoteLookup {
            service,
            reason: reason.to_string(),
        }
    }
}

pub type PaperResult<T> = Result<T, PaperError>;

/// 把标识符（如 DOI）转换为可用作文件名的形式
pub fn safe_file_stem(identifier: &str) -> String {
    identifier
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem_replaces_doi_slash() {
        assert_eq!(
            safe_file_stem("10.1038/s41586-020-2649-2"),
            "10.1038_s41586-020-2649-2"
        );
    }

    #[test]
    fn test_safe_file_stem_replaces_unsafe_chars() {
        assert_eq!(safe_file_stem(" a:b*c?d\"e<f>g|h\\i j "), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_remote_error_message() {
        let err = PaperError::remote("unpaywall", "503 Service Unavailable");
        assert_eq!(err.to_string(), "unpaywall 请求失败: 503 Service Unavailable");
    }
}
