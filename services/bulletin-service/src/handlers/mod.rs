pub mod bulletins;
pub mod health;
pub mod import;
pub mod merge;

pub use bulletins::*;
pub use health::*;
pub use import::*;
pub use merge::*;

use axum::extract::Multipart;
use bulletin_utils::{BulletinError, BulletinResult};
use std::collections::HashMap;

use crate::pipeline::Upload;

/// Reads every file field of a multipart body, keyed by field name.
pub async fn collect_files(multipart: &mut Multipart) -> BulletinResult<HashMap<String, Upload>> {
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BulletinError::validation("multipart", format!("Upload error: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| BulletinError::validation(name.as_str(), format!("Read error: {}", e)))?;

        files.insert(name, Upload { filename, data });
    }

    Ok(files)
}

pub fn take_file(files: &mut HashMap<String, Upload>, field: &str) -> BulletinResult<Upload> {
    files
        .remove(field)
        .ok_or_else(|| BulletinError::validation(field, "No file provided"))
}
