//! Report Renderer
//!
//! Binds a placeholder map into a DOCX template. The document body, headers
//! and footers are rendered with Handlebars; every other archive entry is
//! copied through unchanged.

use bulletin_models::PlaceholderMap;
use bulletin_utils::{BulletinError, BulletinResult};
use handlebars::Handlebars;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub struct DocxRenderer {
    handlebars: Handlebars<'static>,
    open_brace: Regex,
    close_brace: Regex,
    placeholder: Regex,
    tag: Regex,
}

impl DocxRenderer {
    pub fn new() -> BulletinResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(xml_escape);

        let pattern = |p: &str| {
            Regex::new(p).map_err(|e| BulletinError::internal(format!("Bad pattern {}: {}", p, e)))
        };

        Ok(Self {
            handlebars,
            open_brace: pattern(r"\{(?:<[^>]*>)+\{")?,
            close_brace: pattern(r"\}(?:<[^>]*>)+\}")?,
            placeholder: pattern(r"\{\{([^{}]*?)\}\}")?,
            tag: pattern(r"<[^>]*>")?,
        })
    }

    /// Word splits typed text across runs, so `{{nom}}` may arrive as
    /// `{{</w:t></w:r><w:r><w:t>nom}}`. Markup inside a placeholder is dropped.
    pub fn rejoin_placeholders(&self, xml: &str) -> String {
        let xml = self.open_brace.replace_all(xml, "{{");
        let xml = self.close_brace.replace_all(&xml, "}}");
        self.placeholder
            .replace_all(&xml, |caps: &regex::Captures| {
                format!("{{{{{}}}}}", self.tag.replace_all(&caps[1], ""))
            })
            .into_owned()
    }

    pub fn render_bytes(&self, template: &[u8], data: &PlaceholderMap) -> BulletinResult<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(template))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            let options = FileOptions::default().compression_method(entry.compression());

            if entry.is_dir() {
                writer.add_directory(name, options)?;
                continue;
            }

            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;

            let content = if is_templated_part(&name) {
                let xml = String::from_utf8(content).map_err(|e| {
                    BulletinError::template(format!("{} is not UTF-8: {}", name, e))
                })?;
                let xml = self.rejoin_placeholders(&xml);
                self.handlebars
                    .render_template(&xml, data)
                    .map_err(|e| BulletinError::template(format!("{}: {}", name, e)))?
                    .into_bytes()
            } else {
                content
            };

            writer.start_file(name, options)?;
            writer.write_all(&content)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    pub fn render_to_file(
        &self,
        template: &[u8],
        data: &PlaceholderMap,
        target: &Path,
    ) -> BulletinResult<()> {
        let rendered = self.render_bytes(template, data)?;
        std::fs::write(target, rendered)?;
        Ok(())
    }
}

fn is_templated_part(name: &str) -> bool {
    if name == "word/document.xml" {
        return true;
    }
    name.strip_prefix("word/")
        .filter(|rest| !rest.contains('/') && rest.ends_with(".xml"))
        .map_or(false, |rest| rest.starts_with("header") || rest.starts_with("footer"))
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal DOCX-shaped archive with the given entries.
    pub(crate) fn build_docx(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn read_entry(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_rejoin_split_placeholder() {
        let renderer = DocxRenderer::new().unwrap();
        let xml = r#"<w:t>{{</w:t></w:r><w:r><w:t>nom</w:t></w:r><w:r><w:t>Apprenant}}</w:t>"#;
        assert_eq!(
            renderer.rejoin_placeholders(xml),
            "<w:t>{{nomApprenant}}</w:t>"
        );

        let xml = r#"<w:t>{</w:t></w:r><w:r><w:t>{note1}</w:t></w:r><w:r><w:t>}</w:t>"#;
        assert_eq!(renderer.rejoin_placeholders(xml), "<w:t>{{note1}}</w:t>");
    }

    #[test]
    fn test_untouched_xml_is_stable() {
        let renderer = DocxRenderer::new().unwrap();
        let xml = r#"<w:p><w:r><w:t>Moyenne : {{moyenne}}</w:t></w:r></w:p>"#;
        assert_eq!(renderer.rejoin_placeholders(xml), xml);
    }

    #[test]
    fn test_templated_parts() {
        assert!(is_templated_part("word/document.xml"));
        assert!(is_templated_part("word/header1.xml"));
        assert!(is_templated_part("word/footer2.xml"));
        assert!(!is_templated_part("word/styles.xml"));
        assert!(!is_templated_part("word/_rels/header1.xml.rels"));
        assert!(!is_templated_part("[Content_Types].xml"));
    }

    #[test]
    fn test_render_docx() {
        let template = build_docx(&[
            ("[Content_Types].xml", "<Types/>"),
            (
                "word/document.xml",
                "<w:body><w:t>{{nomApprenant}}</w:t><w:t>{{note1}}</w:t><w:t>{{</w:t><w:t>moyenne}}</w:t><w:t>[{{missing}}]</w:t></w:body>",
            ),
            ("word/header1.xml", "<w:hdr><w:t>{{campus}}</w:t></w:hdr>"),
            ("word/styles.xml", "<w:styles>{{campus}}</w:styles>"),
        ]);

        let mut data = PlaceholderMap::new();
        data.insert("nomApprenant", "DUPONT & Fils <Marie>");
        data.insert("note1", "12.50");
        data.insert("moyenne", 10.5);
        data.insert("campus", "Paris");

        let rendered = DocxRenderer::new().unwrap().render_bytes(&template, &data).unwrap();

        assert_eq!(
            read_entry(&rendered, "word/document.xml"),
            "<w:body><w:t>DUPONT &amp; Fils &lt;Marie&gt;</w:t><w:t>12.50</w:t><w:t>10.5</w:t><w:t>[]</w:t></w:body>"
        );
        assert_eq!(read_entry(&rendered, "word/header1.xml"), "<w:hdr><w:t>Paris</w:t></w:hdr>");
        assert_eq!(read_entry(&rendered, "word/styles.xml"), "<w:styles>{{campus}}</w:styles>");
        assert_eq!(read_entry(&rendered, "[Content_Types].xml"), "<Types/>");
    }

    #[test]
    fn test_not_a_docx() {
        let err = DocxRenderer::new()
            .unwrap()
            .render_bytes(b"plain text", &PlaceholderMap::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "TEMPLATE_ERROR");
    }
}
