//! DOCX 文档访问器 - 基础设施层
//!
//! 持有解压前的 zip 包和正文部件，只暴露"读段落 / 改段落 / 写出"的能力。
//! 不认识建议、批次，也不处理业务流程。
//!
//! 段落 = 正文部件中所有最外层的 `w:p` 元素，按文档顺序排列。
//! 表格单元格、内容控件（`w:sdt`）里的段落各自计为一个段落；
//! 文本框里嵌套的 `w:p` 归属外层段落，但其文字不计入外层段落的文本。
//! 文件读写走 `tokio::fs`，`from_bytes` / `to_bytes` 只处理内存数据。

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{AppError, AppResult, ContainerError, FileError};
use crate::infrastructure::upload_store::UploadStore;

/// 正文部件在 zip 包中的路径
pub const DOCUMENT_PART: &str = "word/document.xml";

/// 段落开始 / 结束 / 自闭合标签（不匹配 `w:pPr` 等）
static PARAGRAPH_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)w:p(?:\s[^>]*?)?(/?)>").expect("段落标签正则非法")
});

/// 段落属性
static PARAGRAPH_PROPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:pPr(?:\s[^>]*?)?/>|<w:pPr(?:\s[^>]*)?>.*?</w:pPr>")
        .expect("段落属性正则非法")
});

/// 文本节点、制表符、换行
static TEXT_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(tab|br|cr)(?:\s[^>]*?)?/>")
        .expect("文本节点正则非法")
});

/// 文本框内容和兼容性备选内容（`mc:Fallback` 是 `mc:Choice` 的副本）
static EMBEDDED_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<mc:Fallback(?:\s[^>]*)?>.*?</mc:Fallback>|<w:txbxContent(?:\s[^>]*)?>.*?</w:txbxContent>")
        .expect("嵌入内容正则非法")
});

/// XML 实体
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("实体正则非法")
});

/// 文档访问能力
///
/// 打开文档、按顺序读取段落文本、原地替换段落文本、写出到新路径。
#[async_trait]
pub trait DocumentAccessor: Sized + Send + Sync {
    /// 打开文档，不是合法容器时返回 `MalformedContainer`
    async fn open(path: &Path) -> AppResult<Self>;

    /// 当前的段落文本序列
    fn paragraphs(&self) -> Vec<String>;

    fn paragraph_count(&self) -> usize {
        self.paragraphs().len()
    }

    /// 替换指定段落的文本
    fn set_text(&mut self, index: usize, text: &str) -> AppResult<()>;

    /// 写出到指定路径
    async fn save(&self, path: &Path) -> AppResult<()>;
}

/// 顶层段落在正文 XML 中的位置
#[derive(Debug, Clone)]
struct ParagraphSpan {
    start: usize,
    end: usize,
    text: String,
}

/// `.docx` 文档
#[derive(Debug, Clone)]
pub struct DocxDocument {
    archive_bytes: Vec<u8>,
    xml: String,
    spans: Vec<ParagraphSpan>,
    replacements: BTreeMap<usize, String>,
}

impl DocxDocument {
    /// 从内存中的 zip 包解析文档
    pub fn from_bytes(bytes: Vec<u8>) -> AppResult<Self> {
        let xml = {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))
                .map_err(|_| AppError::not_an_archive(&bytes))?;

            let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
                AppError::MalformedContainer(ContainerError::MissingPart {
                    part: DOCUMENT_PART.to_string(),
                })
            })?;

            let mut xml = String::new();
            part.read_to_string(&mut xml).map_err(|e| {
                AppError::MalformedContainer(ContainerError::BadPart {
                    reason: e.to_string(),
                })
            })?;
            xml
        };

        let spans = scan_paragraphs(&xml)?;
        debug!("解析正文部件完成，共 {} 个段落", spans.len());

        Ok(Self {
            archive_bytes: bytes,
            xml,
            spans,
            replacements: BTreeMap::new(),
        })
    }

    /// 生成只包含给定段落的最小 `.docx` 包
    pub fn package_from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> AppResult<Vec<u8>> {
        let body: String = paragraphs
            .iter()
            .map(|p| match p.as_ref() {
                "" => "<w:p/>".to_string(),
                text => format!("<w:p>{}</w:p>", render_runs(text)),
            })
            .collect();

        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body>{}<w:sectPr/></w:body></w:document>"
            ),
            body
        );

        let content_types = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" "#,
            r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            "</Types>"
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in [
            ("[Content_Types].xml", content_types),
            (DOCUMENT_PART, document.as_str()),
        ] {
            writer.start_file(name, entry_options()).map_err(archive_error)?;
            writer
                .write_all(content.as_bytes())
                .map_err(|e| AppError::file_write_failed(name, e))?;
        }

        Ok(writer.finish().map_err(archive_error)?.into_inner())
    }

    /// 写出为新的 zip 包
    ///
    /// 除正文部件外的条目原样复制；正文部件使用固定时间戳重新压缩，
    /// 相同的输入总是得到逐字节相同的输出。
    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let xml = self.render_xml();

        let mut archive =
            ZipArchive::new(Cursor::new(self.archive_bytes.as_slice())).map_err(archive_error)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(archive_error)?;
            if entry.name() == DOCUMENT_PART {
                writer
                    .start_file(DOCUMENT_PART, entry_options())
                    .map_err(archive_error)?;
                writer
                    .write_all(xml.as_bytes())
                    .map_err(|e| AppError::file_write_failed(DOCUMENT_PART, e))?;
            } else {
                writer.raw_copy_file(entry).map_err(archive_error)?;
            }
        }

        Ok(writer.finish().map_err(archive_error)?.into_inner())
    }

    /// 应用所有文本替换后的正文 XML
    fn render_xml(&self) -> String {
        if self.replacements.is_empty() {
            return self.xml.clone();
        }

        let mut out = String::with_capacity(self.xml.len());
        let mut cursor = 0;
        for (index, text) in &self.replacements {
            let span = &self.spans[*index];
            out.push_str(&self.xml[cursor..span.start]);
            out.push_str(&rebuild_paragraph(&self.xml[span.start..span.end], text));
            cursor = span.end;
        }
        out.push_str(&self.xml[cursor..]);
        out
    }
}

#[async_trait]
impl DocumentAccessor for DocxDocument {
    async fn open(path: &Path) -> AppResult<Self> {
        let bytes = UploadStore::read(path).await?;
        Self::from_bytes(bytes)
    }

    fn paragraphs(&self) -> Vec<String> {
        self.spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                self.replacements
                    .get(&i)
                    .cloned()
                    .unwrap_or_else(|| span.text.clone())
            })
            .collect()
    }

    fn paragraph_count(&self) -> usize {
        self.spans.len()
    }

    fn set_text(&mut self, index: usize, text: &str) -> AppResult<()> {
        if index >= self.spans.len() {
            return Err(AppError::invalid_input(format!(
                "段落索引 {} 超出范围 [0, {})",
                index,
                self.spans.len()
            )));
        }
        self.replacements.insert(index, text.to_string());
        Ok(())
    }

    async fn save(&self, path: &Path) -> AppResult<()> {
        let bytes = self.to_bytes()?;
        UploadStore::write_to(path, &bytes).await
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
}

fn archive_error(source: zip::result::ZipError) -> AppError {
    AppError::Io(FileError::ArchiveWriteFailed { source })
}

fn bad_part(reason: impl Into<String>) -> AppError {
    AppError::MalformedContainer(ContainerError::BadPart {
        reason: reason.into(),
    })
}

/// 找出所有顶层段落
fn scan_paragraphs(xml: &str) -> AppResult<Vec<ParagraphSpan>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for caps in PARAGRAPH_TAG.captures_iter(xml) {
        let Some(tag) = caps.get(0) else { continue };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| bad_part(format!("位置 {} 出现多余的 </w:p>", tag.start())))?;
            if depth == 0 {
                spans.push(span_at(xml, start, tag.end()));
            }
        } else if self_closing {
            if depth == 0 {
                spans.push(span_at(xml, tag.start(), tag.end()));
            }
        } else {
            if depth == 0 {
                start = tag.start();
            }
            depth += 1;
        }
    }

    if depth != 0 {
        return Err(bad_part("存在未闭合的 <w:p>"));
    }

    Ok(spans)
}

fn span_at(xml: &str, start: usize, end: usize) -> ParagraphSpan {
    ParagraphSpan {
        start,
        end,
        text: extract_text(&xml[start..end]),
    }
}

/// 提取段落纯文本（忽略段落属性里的制表位定义和文本框内容）
fn extract_text(paragraph_xml: &str) -> String {
    let content = EMBEDDED_CONTENT.replace_all(paragraph_xml, "");
    let content = PARAGRAPH_PROPS.replace_all(&content, "");

    let mut text = String::new();
    for caps in TEXT_NODE.captures_iter(&content) {
        if let Some(raw) = caps.get(1) {
            text.push_str(&unescape(raw.as_str()));
        } else if let Some(kind) = caps.get(2) {
            text.push(if kind.as_str() == "tab" { '\t' } else { '\n' });
        }
    }
    text
}

/// 用单个纯文本 run 重建段落，保留开始标签和段落属性
fn rebuild_paragraph(paragraph_xml: &str, text: &str) -> String {
    let (open_tag, props) = match PARAGRAPH_TAG.find(paragraph_xml) {
        Some(tag) if tag.as_str().ends_with("/>") => {
            let open = format!("{}>", tag.as_str().trim_end_matches("/>").trim_end());
            (open, String::new())
        }
        Some(tag) => {
            let props = PARAGRAPH_PROPS
                .find(paragraph_xml)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (tag.as_str().to_string(), props)
        }
        None => ("<w:p>".to_string(), String::new()),
    };

    format!("{}{}{}</w:p>", open_tag, props, render_runs(text))
}

/// 文本 → run，`\t` / `\n` 转为制表符和换行元素，XML 不允许的控制字符直接丢弃
fn render_runs(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut inner = String::new();
    let mut buffer = String::new();
    let flush = |buffer: &mut String, inner: &mut String| {
        if !buffer.is_empty() {
            inner.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape(buffer)
            ));
            buffer.clear();
        }
    };

    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut buffer, &mut inner);
                inner.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut buffer, &mut inner);
                inner.push_str("<w:br/>");
            }
            '\r' => {}
            c if is_xml_illegal(c) => {}
            _ => buffer.push(ch),
        }
    }
    flush(&mut buffer, &mut inner);

    format!("<w:r>{}</w:r>", inner)
}

/// XML 1.0 不允许出现的字符（制表符、换行、回车以外的 C0 控制字符，以及 U+FFFE / U+FFFF）
fn is_xml_illegal(c: char) -> bool {
    (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
