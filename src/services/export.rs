use crate::core::error::WorkflowError;
use crate::core::io::Storage;
use crate::core::state::{AudienceMode, EpisodeBlock};
use crate::utils::text::{sanitize, split_lines};
use anyhow::Result;
use log::info;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Separates consecutive blocks in the full-script export.
pub const BLOCK_RULE_WIDTH: usize = 40;
const BLOCK_RULE_CHAR: char = '─';

// Half-points: 12pt body, 18pt title.
const BODY_SIZE: u32 = 24;
const TITLE_SIZE: u32 = 36;
// Twips after each paragraph.
const BODY_SPACING_AFTER: u32 = 200;
const TITLE_SPACING_AFTER: u32 = 400;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_TAIL: &str = r#"<w:sectPr/></w:body></w:document>"#;

/// Builds a `.docx` with a centred bold title followed by one paragraph per line.
///
/// Lines are sanitized first; blank lines stay as empty spacer paragraphs.
pub fn export_document<S: AsRef<str>>(title: &str, lines: &[S]) -> Result<Vec<u8>, WorkflowError> {
    let mut body = String::new();
    push_paragraph(&mut body, title, true);
    for line in lines {
        push_paragraph(&mut body, &sanitize(line.as_ref()), false);
    }
    let document = format!("{}{}{}", DOCUMENT_HEAD, body, DOCUMENT_TAIL);

    package(&document).map_err(WorkflowError::Export)
}

fn push_paragraph(out: &mut String, text: &str, title: bool) {
    let (size, after) = if title {
        (TITLE_SIZE, TITLE_SPACING_AFTER)
    } else {
        (BODY_SIZE, BODY_SPACING_AFTER)
    };

    out.push_str("<w:p><w:pPr>");
    if title {
        out.push_str(r#"<w:jc w:val="center"/>"#);
    }
    out.push_str(&format!(r#"<w:spacing w:after="{}"/></w:pPr>"#, after));
    if !text.is_empty() {
        out.push_str("<w:r><w:rPr>");
        if title {
            out.push_str("<w:b/>");
        }
        out.push_str(&format!(
            r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r>"#,
            size = size,
            text = escape(xml_safe(text).as_str()),
        ));
    }
    out.push_str("</w:p>");
}

// XML 1.0 forbids most control characters even when escaped.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\t' || c >= ' ')
        .filter(|&c| c != '\u{FFFE}' && c != '\u{FFFF}')
        .collect()
}

fn package(document_xml: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/document.xml", document_xml),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

pub fn script_title(mode: AudienceMode) -> String {
    format!("{}动漫剧本改编成果", mode.label())
}

/// Header line preceding each block in the script export.
pub fn block_header(block: &EpisodeBlock) -> String {
    format!("第 {} 集改编成果", block.range)
}

/// Lines of the full-script export, in block order.
pub fn script_lines(blocks: &[EpisodeBlock]) -> Vec<String> {
    let rule: String = std::iter::repeat(BLOCK_RULE_CHAR)
        .take(BLOCK_RULE_WIDTH)
        .collect();
    let mut lines = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
            lines.push(rule.clone());
            lines.push(String::new());
        }
        lines.push(block_header(block));
        lines.push(String::new());
        lines.extend(split_lines(&block.content).map(sanitize));
    }
    lines
}

pub fn export_script(mode: AudienceMode, blocks: &[EpisodeBlock]) -> Result<Vec<u8>, WorkflowError> {
    export_document(&script_title(mode), &script_lines(blocks))
}

/// Export of a single analysis result: its sanitized lines and nothing else.
pub fn export_text(title: &str, text: &str) -> Result<Vec<u8>, WorkflowError> {
    let lines: Vec<&str> = split_lines(text).collect();
    export_document(title, &lines)
}

pub fn export_filename(title: &str, unix_millis: u128) -> String {
    format!("{}_{}.docx", title, unix_millis)
}

/// Writes an exported document to `folder` and returns its path.
pub async fn save_export(
    storage: &dyn Storage,
    folder: &str,
    title: &str,
    bytes: &[u8],
) -> Result<String, WorkflowError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let path = Path::new(folder).join(export_filename(title, millis));
    let path = path.to_string_lossy().to_string();
    storage
        .write(&path, bytes)
        .await
        .map_err(WorkflowError::Export)?;
    info!("Exported {} ({} bytes)", path, bytes.len());
    Ok(path)
}
