//! Layout registry loaded from the declarative layouts file.

use bulletin_models::Layout;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{BulletinError, BulletinResult};

#[derive(Debug, Deserialize)]
struct LayoutFile {
    layouts: Vec<Layout>,
}

/// Closed set of known layouts, in file order.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: Vec<Layout>,
}

impl LayoutRegistry {
    pub fn new(layouts: Vec<Layout>) -> BulletinResult<Self> {
        let mut seen = HashSet::new();
        for layout in &layouts {
            if !seen.insert(layout.key.as_str()) {
                return Err(BulletinError::configuration(format!(
                    "Duplicate layout key '{}'",
                    layout.key
                )));
            }
            check_layout(layout)?;
        }
        Ok(Self { layouts })
    }

    pub fn from_yaml_str(raw: &str) -> BulletinResult<Self> {
        let file: LayoutFile = serde_yaml::from_str(raw)?;
        Self::new(file.layouts)
    }

    pub fn load(path: &Path) -> BulletinResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BulletinError::configuration(format!("Cannot read layouts {}: {}", path.display(), e))
        })?;
        let registry = Self::from_yaml_str(&raw)?;
        tracing::info!(count = registry.len(), path = %path.display(), "Loaded layouts");
        Ok(registry)
    }

    pub fn get(&self, key: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layout> {
        self.layouts.iter()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

fn check_layout(layout: &Layout) -> BulletinResult<()> {
    let fail = |message: String| {
        Err(BulletinError::configuration(format!("Layout '{}': {}", layout.key, message)))
    };

    if layout.export_titles.is_empty() {
        return fail("no export titles".to_string());
    }

    let title_count = layout.export_titles.len();
    for (position, subject) in layout.positions() {
        if subject.header >= title_count {
            return fail(format!("subject {} header {} out of range", position, subject.header));
        }
    }

    for unit in &layout.units {
        if unit.header >= title_count {
            return fail(format!("unit {} header {} out of range", unit.name, unit.header));
        }
        if let Some(pos) = unit
            .subjects
            .iter()
            .find(|p| **p == 0 || **p > layout.subject_count())
        {
            return fail(format!("unit {} references unknown subject {}", unit.name, pos));
        }
    }

    if let Some(pos) = layout
        .hidden_credits
        .iter()
        .find(|p| **p == 0 || **p > layout.subject_count())
    {
        return fail(format!("hidden credit position {} is unknown", pos));
    }

    if let Some(columns) = &layout.merge_columns {
        if layout.merge_titles.is_empty() {
            return fail("merge columns without merge titles".to_string());
        }
        // Merge columns are 1-based sheet columns.
        if let Some((field, _)) = columns.indices().iter().find(|(_, col)| *col == 0) {
            return fail(format!("merge column {} must be at least 1", field));
        }
    }

    Ok(())
}
