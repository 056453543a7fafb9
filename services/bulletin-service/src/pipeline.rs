//! Bulk orchestration of the generation, import and merge workflows.
//!
//! One request runs one sequential pipeline. Spreadsheet, archive and PDF
//! work is blocking and runs on the blocking pool.

use base64::Engine;
use bulletin_models::{Layout, SisDocument};
use bulletin_utils::{
    build_placeholders, file_stem_for, today_string, validate_upload_filename, BulletinError,
    BulletinResult, CreditTable, LayoutRegistry, SheetGrid, StudentSheetReader, UnitAggregator,
};
use axum::body::Bytes;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::merge::{merge_workbook, MergeStage, MergeSummary};
use crate::pdf_processor::PdfProcessor;
use crate::remarks::extract_remarks;
use crate::renderer::DocxRenderer;
use crate::AppState;

const PDF_MIME: &str = "application/pdf";

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// DOCX reports written for one upload.
#[derive(Debug)]
pub struct RenderedBatch {
    pub layout: String,
    pub documents: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct GeneratedBulletins {
    pub layout: String,
    pub output_dir: PathBuf,
    pub pdfs: Vec<PathBuf>,
}

/// A PDF that could not be attached to its learner's file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportFailure {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub error: String,
}

#[derive(Debug)]
pub struct ImportReport {
    pub generated: GeneratedBulletins,
    pub failures: Vec<ImportFailure>,
}

#[derive(Debug)]
pub struct MergedSpreadsheet {
    pub layout: String,
    pub path: PathBuf,
    pub summary: MergeSummary,
}

/// Resolves the upload's layout: registered filename first, then the title row.
pub fn resolve_export_layout<'a>(
    registry: &'a LayoutRegistry,
    filename: &str,
    grid: &SheetGrid,
) -> BulletinResult<&'a Layout> {
    registry.resolve_by_filename(filename).or_else(|_| {
        let titles = grid.export_titles();
        registry.resolve_by_export_titles(&titles).map_err(|_| {
            BulletinError::no_matching_template(format!(
                "filename {} and {} header titles",
                filename,
                titles.len()
            ))
        })
    })
}

/// Reads an export and writes one DOCX report per student into `out_dir`.
pub fn render_bulletins(
    registry: &LayoutRegistry,
    credits: &CreditTable,
    renderer: &DocxRenderer,
    templates_dir: &Path,
    upload: &Upload,
    out_dir: &Path,
    today: &str,
) -> BulletinResult<RenderedBatch> {
    let grid = SheetGrid::from_xlsx_bytes(&upload.data)?;
    let layout = resolve_export_layout(registry, &upload.filename, &grid)?;

    let template_name = layout.report_template.as_deref().ok_or_else(|| {
        BulletinError::configuration(format!("Layout '{}' has no report template", layout.key))
    })?;
    let template_path = templates_dir.join(template_name);
    let template = std::fs::read(&template_path).map_err(|e| {
        BulletinError::configuration(format!(
            "Cannot read report template {}: {}",
            template_path.display(),
            e
        ))
    })?;

    let records = StudentSheetReader::new().read(&grid)?;
    let aggregator = UnitAggregator::new(layout, credits);
    let mut used_stems = HashSet::new();
    let mut documents = Vec::with_capacity(records.len());

    for record in &records {
        let results = aggregator.aggregate(record);
        let placeholders = build_placeholders(layout, record, &results, today);

        let stem = unique_stem(&mut used_stems, &file_stem_for(&record.name));
        let path = out_dir.join(format!("{}_bulletin.docx", stem));
        renderer.render_to_file(&template, &placeholders, &path)?;
        documents.push(path);
    }

    tracing::info!(layout = %layout.key, count = documents.len(), "Rendered bulletins");
    Ok(RenderedBatch {
        layout: layout.key.clone(),
        documents,
    })
}

/// Homonyms get a numeric suffix instead of overwriting each other.
fn unique_stem(used: &mut HashSet<String>, stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}_{}", stem, n);
        n += 1;
    }
    candidate
}

/// `{output}/merge/{uuid}/{stem}.xlsx`, fresh for every request.
fn merge_output_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir
        .join("merge")
        .join(Uuid::new_v4().to_string())
        .join(format!("{}.xlsx", stem))
}

async fn run_blocking<T, F>(task: F) -> BulletinResult<T>
where
    F: FnOnce() -> BulletinResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| BulletinError::internal(format!("Background task failed: {}", e)))?
}

async fn save_upload(upload_dir: &Path, upload: &Upload) -> BulletinResult<PathBuf> {
    validate_upload_filename(&upload.filename)?;
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(&upload.filename);
    tokio::fs::write(&path, &upload.data).await?;
    Ok(path)
}

/// Export → DOCX reports → PDFs in a fresh per-request directory.
pub async fn generate(state: &AppState, upload: Upload) -> BulletinResult<GeneratedBulletins> {
    let config = &state.config;
    save_upload(&config.storage.upload_dir, &upload).await?;

    let credits = CreditTable::load(&config.grading.credits_path)?;
    let output_dir = config
        .storage
        .output_dir
        .join("bulletins")
        .join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&output_dir).await?;

    let batch = {
        let layouts = state.layouts.clone();
        let renderer = state.renderer.clone();
        let templates_dir = config.storage.templates_dir.clone();
        let out_dir = output_dir.clone();
        let today = today_string();
        run_blocking(move || {
            render_bulletins(&layouts, &credits, &renderer, &templates_dir, &upload, &out_dir, &today)
        })
        .await
    };

    let batch = match batch {
        Ok(batch) => batch,
        Err(e) => {
            if matches!(e, BulletinError::NoMatchingTemplate { .. }) {
                state.metrics.layout_resolution_failures.inc();
            }
            return Err(e);
        }
    };
    state.metrics.bulletins_rendered.inc_by(batch.documents.len() as u64);

    let pdfs = state.converter.convert_all(&batch.documents, &output_dir).await?;

    Ok(GeneratedBulletins {
        layout: batch.layout,
        output_dir,
        pdfs,
    })
}

/// Generates, then attaches every PDF to the learner named in it.
///
/// Per-file import failures are collected; anything earlier aborts.
pub async fn generate_and_import(state: &AppState, upload: Upload) -> BulletinResult<ImportReport> {
    let generated = generate(state, upload).await?;

    let mut failures = Vec::new();
    for pdf in &generated.pdfs {
        let file = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match import_pdf(state, pdf, &file).await {
            Ok(()) => state.metrics.imports_succeeded.inc(),
            Err(e) => {
                tracing::error!(file = %file, error = %e, "Failed to import bulletin");
                state.metrics.imports_failed.inc();
                let status_code = match &e {
                    BulletinError::ExternalService { status, .. } => *status,
                    _ => None,
                };
                failures.push(ImportFailure {
                    file,
                    status_code,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(ImportReport {
        generated,
        failures,
    })
}

async fn import_pdf(state: &AppState, pdf: &Path, file: &str) -> BulletinResult<()> {
    let path = pdf.to_path_buf();
    let code = run_blocking(move || {
        PdfProcessor::new()
            .extract_code_apprenant(&path)
            .map_err(|e| BulletinError::internal(format!("{:#}", e)))
    })
    .await?
    .ok_or_else(|| BulletinError::validation("codeApprenant", format!("not found in {}", file)))?;

    tracing::info!(code_apprenant = %code, file, "Extracted learner code");

    let content = tokio::fs::read(pdf).await?;
    let document = SisDocument {
        contenu: base64::engine::general_purpose::STANDARD.encode(content),
        nom_document: file.to_string(),
        type_mime: PDF_MIME.to_string(),
        extension: "pdf".to_string(),
    };

    state.ypareo.import_document(&code, &document).await
}

/// Export + remarks → the layout's merge template filled from Yparéo.
pub async fn merge(state: &AppState, excel: Upload, word: Upload) -> BulletinResult<MergedSpreadsheet> {
    let config = &state.config;
    save_upload(&config.storage.upload_dir, &excel).await?;
    save_upload(&config.storage.upload_dir, &word).await?;

    let grid = {
        let data = excel.data.clone();
        run_blocking(move || SheetGrid::from_xlsx_bytes(&data)).await?
    };

    let layout = match state.layouts.resolve_by_merge_titles(&grid.merge_titles()) {
        Ok(layout) => layout.clone(),
        Err(e) => {
            state.metrics.layout_resolution_failures.inc();
            return Err(e);
        }
    };

    let columns = layout.merge_columns.ok_or_else(|| {
        BulletinError::configuration(format!("Layout '{}' has no merge columns", layout.key))
    })?;
    let template_name = layout.merge_template.clone().ok_or_else(|| {
        BulletinError::configuration(format!("Layout '{}' has no merge template", layout.key))
    })?;
    let template_path = config.storage.templates_dir.join(&template_name);
    let stem = Path::new(&template_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| layout.key.clone());

    let output_path = merge_output_path(&config.storage.output_dir, &stem);
    if let Some(dir) = output_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let snapshot = state.ypareo.fetch_snapshot().await?;

    let summary = {
        let output_path = output_path.clone();
        run_blocking(move || {
            let remarks = extract_remarks(&word.data);
            let stage = MergeStage::new(&columns, &snapshot, &remarks);
            merge_workbook(&stage, &grid, &template_path, &output_path)
        })
        .await?
    };

    Ok(MergedSpreadsheet {
        layout: layout.key,
        path: output_path,
        summary,
    })
}
