//! Closed-set layout resolution.
//!
//! A filename must equal one of the registered names. An export title row must
//! equal a layout's export titles. A merge upload must start with a layout's
//! merge titles; cells after them are not part of the match. Titles are
//! compared once both sides are made accent- and case-insensitive. Anything
//! else is `NoMatchingTemplate`.

use bulletin_models::Layout;

use super::registry::LayoutRegistry;
use crate::error::{BulletinError, BulletinResult};
use crate::text::normalize_string;

/// What an upload offers to identify its layout.
#[derive(Debug, Clone, Copy)]
pub enum LayoutSignal<'a> {
    Filename(&'a str),
    /// Title row of a grade export.
    ExportTitles(&'a [String]),
    /// Non-empty fixed title cells of a merge upload, in order.
    MergeTitles(&'a [String]),
}

impl LayoutRegistry {
    pub fn resolve(&self, signal: LayoutSignal<'_>) -> BulletinResult<&Layout> {
        match signal {
            LayoutSignal::Filename(name) => self.resolve_by_filename(name),
            LayoutSignal::ExportTitles(titles) => self.resolve_by_export_titles(titles),
            LayoutSignal::MergeTitles(titles) => self.resolve_by_merge_titles(titles),
        }
    }

    pub fn resolve_by_filename(&self, filename: &str) -> BulletinResult<&Layout> {
        let basename = std::path::Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);

        self.iter()
            .find(|layout| layout.filenames.iter().any(|f| f == basename))
            .ok_or_else(|| BulletinError::no_matching_template(format!("filename {}", basename)))
    }

    pub fn resolve_by_export_titles(&self, titles: &[String]) -> BulletinResult<&Layout> {
        let normalized = normalize_all(titles);

        self.iter()
            .find(|layout| same_titles(&layout.export_titles, &normalized))
            .ok_or_else(|| {
                BulletinError::no_matching_template(format!("{} header titles", titles.len()))
            })
    }

    /// First layout whose merge titles are a prefix of `titles`.
    pub fn resolve_by_merge_titles(&self, titles: &[String]) -> BulletinResult<&Layout> {
        let normalized = normalize_all(titles);

        self.iter()
            .filter(|layout| !layout.merge_titles.is_empty())
            .find(|layout| {
                let count = layout.merge_titles.len();
                normalized.len() >= count && same_titles(&layout.merge_titles, &normalized[..count])
            })
            .ok_or_else(|| {
                BulletinError::no_matching_template(format!("{} merge titles", titles.len()))
            })
    }
}

fn normalize_all(titles: &[String]) -> Vec<String> {
    titles.iter().map(|t| normalize_string(t)).collect()
}

fn same_titles(expected: &[String], normalized: &[String]) -> bool {
    expected.len() == normalized.len()
        && expected
            .iter()
            .zip(normalized)
            .all(|(e, actual)| normalize_string(e) == *actual)
}
