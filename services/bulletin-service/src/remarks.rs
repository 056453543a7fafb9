//! Tutor remarks read from the tables of a DOCX document.
//!
//! Each table row with at least two cells maps its first cell (student name)
//! to its second (remark).

use anyhow::{Context, Result};
use bulletin_utils::normalize_title;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};

#[derive(Debug, Clone, Default)]
pub struct Remarks {
    exact: HashMap<String, String>,
    normalized: HashMap<String, String>,
}

impl Remarks {
    pub fn insert(&mut self, name: &str, remark: &str) {
        self.exact.insert(name.to_string(), remark.to_string());
        self.normalized
            .insert(normalize_title(name), remark.to_string());
    }

    /// Exact name first, then the normalised form.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.exact
            .get(name)
            .or_else(|| self.normalized.get(&normalize_title(name)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Never fails: an unreadable document yields no remarks.
pub fn extract_remarks(docx: &[u8]) -> Remarks {
    match read_remarks(docx) {
        Ok(remarks) => {
            tracing::debug!(count = remarks.len(), "Extracted remarks");
            remarks
        }
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Could not read remarks document");
            Remarks::default()
        }
    }
}

fn read_remarks(docx: &[u8]) -> Result<Remarks> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).context("Not a DOCX archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("Missing word/document.xml")?
        .read_to_string(&mut xml)
        .context("Unreadable word/document.xml")?;

    let mut remarks = Remarks::default();
    for row in table_rows(&xml)? {
        if row.len() < 2 {
            continue;
        }
        let name = row[0].trim();
        let remark = row[1].trim();
        if !name.is_empty() && !remark.is_empty() {
            remarks.insert(name, remark);
        }
    }
    Ok(remarks)
}

/// Cell texts of every table row, paragraphs joined by newlines.
fn table_rows(xml: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);

    let mut rows = Vec::new();
    // Nested tables push their own row and cell.
    let mut open_rows: Vec<Vec<String>> = Vec::new();
    let mut open_cells: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event().context("Malformed document XML")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tr" => open_rows.push(Vec::new()),
                b"w:tc" => open_cells.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(cell) = open_cells.last_mut() {
                        cell.push('\n');
                    }
                }
                b"w:tc" => {
                    if let (Some(cell), Some(row)) = (open_cells.pop(), open_rows.last_mut()) {
                        row.push(cell.trim_end_matches('\n').to_string());
                    }
                }
                b"w:tr" => {
                    if let Some(row) = open_rows.pop() {
                        rows.push(row);
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(cell) = open_cells.last_mut() {
                    cell.push_str(&t.unescape().context("Bad text escape")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}
