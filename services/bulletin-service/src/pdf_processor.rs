//! PDF Processor
//!
//! Reads the learner identifier printed on a generated report.

use anyhow::{Context, Result};
use std::path::Path;

const IDENTIFIER_LABEL: &str = "Identifiant :";

pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_text(&self, data: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(data).context("Failed to extract text from PDF")
    }

    /// Learner code found after `Identifiant :`, if any.
    pub fn extract_code_apprenant(&self, path: &Path) -> Result<Option<String>> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let text = self.extract_text(&data)?;
        Ok(find_identifier(&text))
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// First line holding the identifier label; its remainder must be a number.
///
/// `"12345.0"` yields `"12345"`.
pub fn find_identifier(text: &str) -> Option<String> {
    let line = text.lines().find(|line| line.contains(IDENTIFIER_LABEL))?;
    let (_, rest) = line.split_once(IDENTIFIER_LABEL)?;
    let value = rest.trim();

    if value.is_empty()
        || value.matches('.').count() > 1
        || !value.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }

    let integer = value.split('.').next().unwrap_or("");
    if integer.is_empty() {
        return None;
    }
    integer.parse::<u64>().ok().map(|code| code.to_string())
}
