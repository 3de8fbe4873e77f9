use std::path::Path;
use tracing::{debug, info, warn};

use crate::utils::{PaperError, PaperResult};

/// 把PDF文件读成一整段文本
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> PaperResult<String>;
}

pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    /// 提取全文，以 pdf-extract 为主，lopdf 逐页提取兜底
    pub fn extract_full_text(&self, bytes: &[u8]) -> PaperResult<String> {
        let mut document = lopdf::Document::load_mem(bytes)
            .map_err(|e| PaperError::DocumentRead(format!("无法解析PDF: {}", e)))?;

        // 只设置了所有者密码的PDF可以用空密码打开
        let decrypted = if document.is_encrypted() {
            document
                .decrypt("")
                .map_err(|e| PaperError::DocumentRead(format!("PDF已加密，需要密码: {}", e)))?;
            document.trailer.remove(b"Encrypt");
            let mut plain = Vec::new();
            document
                .save_to(&mut plain)
                .map_err(|e| PaperError::DocumentRead(format!("解密后写出失败: {}", e)))?;
            info!("已用空密码解密PDF");
            Some(plain)
        } else {
            None
        };

        let page_count = document.get_pages().len();

        let full_text = match pdf_extract::extract_text_from_mem(decrypted.as_deref().unwrap_or(bytes)) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("pdf-extract 未提取到文本，改用 lopdf");
                extract_pages(&document)
            }
            Err(e) => {
                warn!("pdf-extract 提取失败，改用 lopdf: {}", e);
                extract_pages(&document)
            }
        };

        info!("提取文本: {} 页, {} 字符", page_count, full_text.len());
        Ok(full_text)
    }
}

/// 按页序拼接，每页以换行结尾
fn extract_pages(document: &lopdf::Document) -> String {
    let mut full_text = String::new();
    for &page_number in document.get_pages().keys() {
        match document.extract_text(&[page_number]) {
            Ok(text) => {
                full_text.push_str(&text);
                if !text.ends_with('\n') {
                    full_text.push('\n');
                }
            }
            Err(e) => debug!("第 {} 页文本提取失败: {}", page_number, e),
        }
    }
    full_text
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for PdfParser {
    fn load(&self, path: &Path) -> PaperResult<String> {
        info!("提取PDF完整文本: {}", path.display());

        if !path.exists() {
            return Err(PaperError::DocumentRead(format!(
                "PDF文件不存在: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| PaperError::DocumentRead(format!("{}: {}", path.display(), e)))?;

        self.extract_full_text(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SectionExtractor, SectionLabel};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    const ENCRYPTED_PDF: &[u8] = include_bytes!("../../testdata/encrypted_empty_user_password.pdf");

    /// 单页PDF，各行之间用 T* 换行
    fn single_page_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn assert_abstract_and_introduction(text: &str) {
        let sections = SectionExtractor::new().extract(text);
        assert_eq!(
            sections.get(SectionLabel::Abstract),
            "Abstract\nPlants grow in light."
        );
        assert_eq!(
            sections.get(SectionLabel::Introduction),
            "Introduction\nMore text here."
        );
    }

    #[test]
    fn test_text_lines_keep_line_breaks_for_section_split() {
        let bytes = single_page_pdf(&[
            "Abstract",
            "Plants grow in light.",
            "Introduction",
            "More text here.",
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, bytes).unwrap();

        let text = PdfParser::new().load(&path).unwrap();
        assert!(text.contains("Abstract\nPlants grow in light.\nIntroduction\n"));
        assert_abstract_and_introduction(&text);
    }

    #[test]
    fn test_owner_only_encrypted_pdf_opens_with_empty_password() {
        let text = PdfParser::new().extract_full_text(ENCRYPTED_PDF).unwrap();
        assert_abstract_and_introduction(&text);
    }

    #[test]
    fn test_encrypted_pdf_needing_user_password_is_document_read_error() {
        // 改写 /U 后空密码校验失败
        let mut bytes = ENCRYPTED_PDF.to_vec();
        let marker = b"/U <";
        let start = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap()
            + marker.len();
        bytes[start..start + 64].fill(b'0');

        let err = PdfParser::new().extract_full_text(&bytes).unwrap_err();
        assert!(matches!(err, PaperError::DocumentRead(_)));
    }

    #[test]
    fn test_missing_file_is_document_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfParser::new()
            .load(&dir.path().join("missing.pdf"))
            .unwrap_err();
        assert!(matches!(err, PaperError::DocumentRead(_)));
    }

    #[test]
    fn test_corrupt_file_is_document_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = PdfParser::new().load(&path).unwrap_err();
        assert!(matches!(err, PaperError::DocumentRead(_)));
    }
}
