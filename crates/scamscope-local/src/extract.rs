//! File-to-text extraction for uploaded documents and images.
//!
//! Dispatch order mirrors what users upload: PDF, DOCX, image (OCR), plain text. Each kind is
//! selected by declared MIME type first, then by file-name extension; when neither is
//! available the leading bytes are sniffed for PDF/PNG/JPEG magic.
//!
//! Pure-Rust extractors run first. Local tools (`pdftotext`/`mutool`, `pandoc`, `tesseract`)
//! are a bounded fallback, see [`crate::shellout`].

use crate::shellout;
use serde::Serialize;
use std::io::{Cursor, Read};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Docx,
    Image,
    Text,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Image => "image",
            FileKind::Text => "text",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("error reading {kind}: {detail}")]
    Corrupt { kind: &'static str, detail: String },
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("error reading image: {0}")]
    Ocr(String),
    #[error("no text found in {0}")]
    Empty(String),
}

impl ExtractError {
    /// Stable machine-readable code for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::Corrupt { .. } => "corrupt_file",
            ExtractError::Unsupported(_) => "unsupported_file_type",
            ExtractError::Ocr(_) => "ocr_failed",
            ExtractError::Empty(_) => "empty_text",
        }
    }
}

impl From<ExtractError> for scamscope_core::Error {
    fn from(e: ExtractError) -> Self {
        scamscope_core::Error::Extract(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub kind: FileKind,
    pub engine: &'static str,
    pub text: String,
    pub warnings: Vec<&'static str>,
}

fn extension_lc(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Best-effort sniff for PDF bytes (magic header).
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Best-effort sniff for the image formats we OCR.
pub fn bytes_look_like_image(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\x89PNG\r\n\x1a\n") || bytes.starts_with(b"\xff\xd8\xff")
}

/// Pick an extractor from declared MIME type and file name.
pub fn detect_kind(file_name: &str, mime: Option<&str>) -> Option<FileKind> {
    let ct = mime
        .map(|m| {
            m.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();
    let ext = extension_lc(file_name);

    if ct == "application/pdf" || ext == "pdf" {
        Some(FileKind::Pdf)
    } else if ct == DOCX_MIME || ext == "docx" {
        Some(FileKind::Docx)
    } else if matches!(ct.as_str(), "image/png" | "image/jpeg" | "image/jpg")
        || matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    {
        Some(FileKind::Image)
    } else if ct == "text/plain" || ext == "txt" {
        Some(FileKind::Text)
    } else {
        None
    }
}

/// Extract text from an uploaded file.
///
/// The returned text is trimmed; a file that yields only whitespace is `ExtractError::Empty`.
pub fn extract_text(
    bytes: &[u8],
    file_name: &str,
    mime: Option<&str>,
) -> Result<ExtractedText, ExtractError> {
    let kind = match detect_kind(file_name, mime) {
        Some(k) => k,
        None if mime.is_none() && bytes_look_like_pdf(bytes) => FileKind::Pdf,
        None if mime.is_none() && bytes_look_like_image(bytes) => FileKind::Image,
        None => {
            let what = mime
                .map(str::to_string)
                .unwrap_or_else(|| file_name.to_string());
            return Err(ExtractError::Unsupported(what));
        }
    };

    let mut out = match kind {
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Docx => extract_docx(bytes)?,
        FileKind::Image => extract_image(bytes, file_name)?,
        FileKind::Text => ExtractedText {
            kind,
            engine: "utf8",
            text: std::str::from_utf8(bytes)
                .map_err(|e| ExtractError::Corrupt {
                    kind: "text",
                    detail: e.to_string(),
                })?
                .to_string(),
            warnings: Vec::new(),
        },
    };

    let trimmed = out.text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Empty(file_name.to_string()));
    }
    if trimmed.len() != out.text.len() {
        out.text = trimmed.to_string();
    }
    tracing::debug!(
        kind = kind.as_str(),
        engine = out.engine,
        chars = out.text.chars().count(),
        "extracted text"
    );
    Ok(out)
}

/// Extract text from a PDF body (in-memory bytes).
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs; keep it contained to this upload.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "pdf parser panicked".to_string())?
        .map_err(|e| e.to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
    let mut warnings = Vec::new();
    let err = match pdf_to_text(bytes) {
        Ok(text) if text.chars().any(|c| !c.is_whitespace()) => {
            return Ok(ExtractedText {
                kind: FileKind::Pdf,
                engine: "pdf-extract",
                text,
                warnings,
            })
        }
        // Scanned PDFs parse fine but carry no text layer.
        Ok(_) => "no text layer".to_string(),
        Err(e) => e,
    };
    warnings.push("pdf_extract_failed");
    match shellout::pdf_to_text(bytes) {
        Ok((engine, text)) => {
            warnings.push("pdf_shellout_used");
            Ok(ExtractedText {
                kind: FileKind::Pdf,
                engine,
                text,
                warnings,
            })
        }
        Err(code) => {
            let detail = if shellout::pdf_shellout_mode_from_env() == shellout::Mode::Strict {
                format!("{err} ({code})")
            } else {
                err
            };
            Err(ExtractError::Corrupt {
                kind: "pdf",
                detail,
            })
        }
    }
}

/// Extract paragraph text from a DOCX body (zip container with `word/document.xml`).
pub fn docx_to_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;
    document_xml_to_text(&xml)
}

/// Flatten WordprocessingML into one line per paragraph (`w:p`).
///
/// Paragraphs nest (text boxes sit inside a run of their anchor paragraph), so open paragraphs
/// are kept on a stack; an inner paragraph is emitted when it closes and its anchor keeps the
/// text on both sides of it.
fn document_xml_to_text(xml: &str) -> Result<String, String> {
    use quick_xml::events::Event;

    // No trim_text: leading/trailing spaces inside `w:t` runs are significant.
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:p", _) => paragraphs.push(String::new()),
                (b"w:tab", Some(cur)) if run_depth > 0 => cur.push('\t'),
                (b"w:br" | b"w:cr", Some(cur)) if run_depth > 0 => cur.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let s = t.unescape().map_err(|e| e.to_string())?;
                if let Some(cur) = open.last_mut() {
                    cur.push_str(&s);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:p" => paragraphs.extend(open.pop()),
                _ => {}
            },
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(paragraphs.join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
    let err = match docx_to_text(bytes) {
        Ok(text) => {
            return Ok(ExtractedText {
                kind: FileKind::Docx,
                engine: "docx-xml",
                text,
                warnings: Vec::new(),
            })
        }
        Err(e) => e,
    };
    match shellout::pandoc_to_text(bytes, ".docx") {
        Ok(text) => Ok(ExtractedText {
            kind: FileKind::Docx,
            engine: "pandoc",
            text,
            warnings: vec!["docx_xml_failed", "pandoc_used"],
        }),
        Err(code) => {
            let detail = if shellout::pandoc_mode_from_env() == shellout::Mode::Strict {
                format!("{err} ({code})")
            } else {
                err
            };
            Err(ExtractError::Corrupt {
                kind: "docx",
                detail,
            })
        }
    }
}

fn extract_image(bytes: &[u8], file_name: &str) -> Result<ExtractedText, ExtractError> {
    let suffix = if bytes.starts_with(b"\x89PNG") || extension_lc(file_name) == "png" {
        ".png"
    } else {
        ".jpg"
    };
    match shellout::tesseract_ocr(bytes, suffix) {
        Ok(text) => Ok(ExtractedText {
            kind: FileKind::Image,
            engine: "tesseract",
            text,
            warnings: vec!["tesseract_used"],
        }),
        Err(code) => Err(ExtractError::Ocr(code.to_string())),
    }
}

/// Retry an [`extract_text`] OCR failure through Gemini vision; other results pass through.
#[cfg(feature = "vision-gemini")]
pub async fn vision_fallback(
    gemini: &crate::gemini::GeminiClient,
    local: Result<ExtractedText, ExtractError>,
    bytes: &[u8],
    file_name: &str,
) -> Result<ExtractedText, ExtractError> {
    match local {
        Err(ExtractError::Ocr(code)) => {
            tracing::debug!(ocr = %code, "local OCR unavailable; trying gemini vision");
            let image_mime = if bytes.starts_with(b"\x89PNG") {
                "image/png"
            } else {
                "image/jpeg"
            };
            let text = gemini
                .image_to_text(bytes, image_mime)
                .await
                .map_err(|e| ExtractError::Ocr(format!("{code}; {e}")))?;
            let text = text.trim();
            if text.is_empty() {
                return Err(ExtractError::Empty(file_name.to_string()));
            }
            Ok(ExtractedText {
                kind: FileKind::Image,
                engine: "gemini_vision",
                text: text.to_string(),
                warnings: vec!["vision_fallback_used"],
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            w.start_file("word/document.xml", opts).unwrap();
            w.write_all(document_xml.as_bytes()).unwrap();
            w.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn detect_kind_prefers_mime_then_extension() {
        assert_eq!(detect_kind("x.bin", Some("application/pdf")), Some(FileKind::Pdf));
        assert_eq!(detect_kind("Letter.DOCX", None), Some(FileKind::Docx));
        assert_eq!(detect_kind("scan.jpeg", None), Some(FileKind::Image));
        assert_eq!(
            detect_kind("x", Some("text/plain; charset=utf-8")),
            Some(FileKind::Text)
        );
        assert_eq!(detect_kind("notes.md", None), None);
        assert_eq!(detect_kind("a.gif", Some("image/gif")), None);
    }

    #[test]
    fn plain_text_is_decoded_and_trimmed() {
        let out = extract_text(b"  Send $500 now\n", "msg.txt", None).expect("text");
        assert_eq!(out.kind, FileKind::Text);
        assert_eq!(out.engine, "utf8");
        assert_eq!(out.text, "Send $500 now");
    }

    #[test]
    fn invalid_utf8_text_is_corrupt() {
        let err = extract_text(&[0xff, 0xfe, 0x41], "msg.txt", None).unwrap_err();
        assert_eq!(err.code(), "corrupt_file");
    }

    #[test]
    fn whitespace_only_file_is_empty() {
        let err = extract_text(b" \n\t ", "blank.txt", Some("text/plain")).unwrap_err();
        assert_eq!(err, ExtractError::Empty("blank.txt".to_string()));
    }

    #[test]
    fn unsupported_type_names_the_declared_mime() {
        let err = extract_text(b"GIF89a....", "a.gif", Some("image/gif")).unwrap_err();
        assert_eq!(err, ExtractError::Unsupported("image/gif".to_string()));
        assert_eq!(err.to_string(), "unsupported file type: image/gif");

        let err = extract_text(b"hello", "notes.md", None).unwrap_err();
        assert_eq!(err, ExtractError::Unsupported("notes.md".to_string()));
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
      <w:r><w:t>URGENT! </w:t></w:r><w:r><w:t xml:space="preserve">Verify &amp; pay</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Amount:</w:t><w:tab/><w:t>$500</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let out = extract_text(&docx_bytes(xml), "letter.docx", None).expect("docx");
        assert_eq!(out.engine, "docx-xml");
        assert_eq!(out.text, "URGENT! Verify & pay\n\nAmount:\t$500");
    }

    #[test]
    fn docx_text_box_keeps_anchor_paragraph_text() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t xml:space="preserve">Before </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Inner</w:t></w:r></w:p></w:txbxContent></w:pict></w:r><w:r><w:t>After</w:t><w:tab/><w:t>$500</w:t></w:r></w:p>
</w:body></w:document>"#;
        let out = extract_text(&docx_bytes(xml), "notice.docx", None).expect("docx");
        assert_eq!(out.text, "Inner\nBefore After\t$500");
    }

    #[test]
    fn docx_that_is_not_a_zip_is_corrupt() {
        std::env::set_var("SCAMSCOPE_PANDOC", "off");
        let err = extract_text(b"definitely not a zip", "x.docx", None).unwrap_err();
        match err {
            ExtractError::Corrupt { kind, .. } => assert_eq!(kind, "docx"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn image_without_ocr_is_an_ocr_error() {
        // Keep the test deterministic: don't depend on local `tesseract` presence.
        std::env::set_var("SCAMSCOPE_OCR", "off");
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";
        let err = extract_text(png, "shot.png", Some("image/png")).unwrap_err();
        assert_eq!(err, ExtractError::Ocr("ocr_disabled".to_string()));
    }

    #[test]
    fn sniffing_only_applies_without_declared_mime() {
        std::env::set_var("SCAMSCOPE_OCR", "off");
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";
        assert!(matches!(
            extract_text(png, "upload", None),
            Err(ExtractError::Ocr(_))
        ));
        assert!(matches!(
            extract_text(png, "upload", Some("application/octet-stream")),
            Err(ExtractError::Unsupported(_))
        ));
    }

    #[test]
    fn bytes_look_like_pdf_sniffs_magic_header() {
        assert!(bytes_look_like_pdf(b"%PDF-1.7\n%..."));
        assert!(!bytes_look_like_pdf(b"<!doctype html><html>"));
        assert!(!bytes_look_like_pdf(b""));
    }
}
