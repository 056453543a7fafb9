//! Spreadsheet Merge Stage
//!
//! Copies an uploaded grade export into the layout's spreadsheet template,
//! filling identity, group and absence columns from Yparéo and remarks from a
//! DOCX document.
//!
//! Rows and columns are 1-based here, as in the template workbook.

use bulletin_models::{Absence, Apprenant, Groupe, MergeColumns};
use bulletin_utils::{normalize_title, sum_durations, BulletinError, BulletinResult, SheetGrid};
use std::collections::HashMap;
use std::path::Path;
use umya_spreadsheet::Worksheet;

use crate::remarks::Remarks;
use crate::ypareo_client::SisSnapshot;

/// Title row of the uploaded export (1-based).
pub const UPLOADED_HEADER_ROW: u32 = 4;
/// Title row of the merge template (1-based).
pub const TEMPLATE_HEADER_ROW: u32 = 1;

const NAME_HEADER: &str = "Nom";
const SUBHEADER: &str = "Note";
const MISSING: &str = "N/A";
const NO_DURATION: &str = "00h00";
pub const ABSENCE_DISCLAIMER: &str = "* Attention, le total des absences prend en compte toutes les absences aux séances sur la période concernée. S'il existe des absences sur des matières qui ne figurent pas dans le relevé, elles seront également comptabilisées.";

/// Cell access the merge needs from a worksheet.
pub trait MergeSheet {
    fn value(&self, col: u32, row: u32) -> String;
    fn set(&mut self, col: u32, row: u32, value: &str);
    fn clear(&mut self, col: u32, row: u32);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

impl MergeSheet for Worksheet {
    fn value(&self, col: u32, row: u32) -> String {
        self.get_value((col, row))
    }

    fn set(&mut self, col: u32, row: u32, value: &str) {
        self.get_cell_mut((col, row)).set_value(value);
    }

    fn clear(&mut self, col: u32, row: u32) {
        if self.get_cell((col, row)).is_some() {
            self.get_cell_mut((col, row)).set_value("");
        }
    }

    fn width(&self) -> u32 {
        self.get_highest_column()
    }

    fn height(&self) -> u32 {
        self.get_highest_row()
    }
}

/// Absence durations of one learner, in minutes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsenceTotals {
    pub justified: Vec<i64>,
    pub unjustified: Vec<i64>,
    pub delays: Vec<i64>,
}

impl AbsenceTotals {
    /// `(justified, unjustified, delays)` as `HHhMM`, `00h00` when empty.
    pub fn formatted(&self) -> (String, String, String) {
        let fmt = |values: &[i64]| sum_durations(values).unwrap_or_else(|| NO_DURATION.to_string());
        (fmt(&self.justified), fmt(&self.unjustified), fmt(&self.delays))
    }
}

/// Groups absences by learner code. Justified wins over delay.
pub fn summarize_absences(absences: &[Absence]) -> HashMap<String, AbsenceTotals> {
    let mut summary: HashMap<String, AbsenceTotals> = HashMap::new();
    for absence in absences {
        let Some(code) = absence.code_apprenant.as_ref() else {
            continue;
        };
        let minutes = absence.duree.as_ref().map_or(0, |d| d.as_i64());
        let totals = summary.entry(code.to_string()).or_default();

        if absence.is_justifie.unwrap_or(false) {
            totals.justified.push(minutes);
        } else if absence.is_retard.unwrap_or(false) {
            totals.delays.push(minutes);
        } else {
            totals.unjustified.push(minutes);
        }
    }
    summary
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MergeSummary {
    pub rows_written: usize,
    pub matched_columns: usize,
    pub sis_matches: usize,
    pub remarks_written: usize,
}

pub struct MergeStage<'a> {
    columns: &'a MergeColumns,
    apprenants: HashMap<String, &'a Apprenant>,
    groupes: HashMap<String, &'a Groupe>,
    absences: HashMap<String, AbsenceTotals>,
    remarks: &'a Remarks,
}

impl<'a> MergeStage<'a> {
    pub fn new(columns: &'a MergeColumns, snapshot: &'a SisSnapshot, remarks: &'a Remarks) -> Self {
        let apprenants = snapshot
            .apprenants
            .iter()
            .map(|a| (normalize_title(&a.full_name()), a))
            .collect();
        let groupes = snapshot
            .groupes
            .iter()
            .filter_map(|g| g.code_groupe.as_ref().map(|code| (code.to_string(), g)))
            .collect();

        Self {
            columns,
            apprenants,
            groupes,
            absences: summarize_absences(&snapshot.absences),
            remarks,
        }
    }

    pub fn merge<S: MergeSheet>(&self, uploaded: &SheetGrid, template: &mut S) -> BulletinResult<MergeSummary> {
        let matching = matching_columns(uploaded, template);
        if matching.is_empty() {
            return Err(BulletinError::spreadsheet(
                "No matching columns between the upload and the template",
            ));
        }

        let mut summary = MergeSummary {
            matched_columns: matching.len(),
            ..Default::default()
        };

        template.set(self.columns.name_template, TEMPLATE_HEADER_ROW + 1, NAME_HEADER);

        let first_row = UPLOADED_HEADER_ROW as usize; // 0-based index of the first data row
        for source_row in first_row..uploaded.height() {
            if uploaded.is_group_average_row(source_row) {
                continue;
            }

            // 1-based source row minus the header offset
            let target_row = source_row as u32 + 1 - UPLOADED_HEADER_ROW + TEMPLATE_HEADER_ROW + 1;
            let name = uploaded.cell(source_row, (self.columns.name_uploaded as usize).saturating_sub(1));
            template.set(self.columns.name_template, target_row, name);

            let learner = Some(normalize_title(name))
                .filter(|key| !key.is_empty())
                .and_then(|key| self.apprenants.get(&key));
            if let Some(apprenant) = learner {
                self.write_learner(template, target_row, apprenant);
                summary.sis_matches += 1;
            }

            for (source_col, target_col) in &matching {
                template.set(*target_col, target_row, uploaded.cell(source_row, *source_col));
            }
            summary.rows_written += 1;
        }

        clean_template(template);
        summary.remarks_written = self.write_remarks(template);

        tracing::info!(
            rows = summary.rows_written,
            columns = summary.matched_columns,
            sis_matches = summary.sis_matches,
            remarks = summary.remarks_written,
            "Merged upload into template"
        );
        Ok(summary)
    }

    fn write_learner<S: MergeSheet>(&self, sheet: &mut S, row: u32, apprenant: &Apprenant) {
        let c = self.columns;
        let code = apprenant.code_apprenant.as_ref().map(|v| v.to_string());

        sheet.set(c.code_apprenant, row, code.as_deref().unwrap_or(MISSING));
        sheet.set(c.date_naissance, row, apprenant.date_naissance.as_deref().unwrap_or(MISSING));
        if apprenant.inscriptions.as_ref().map_or(false, |i| !i.is_empty()) {
            sheet.set(c.nom_site, row, apprenant.site_name().unwrap_or(MISSING));
        }

        if let Some(groupe) = apprenant.group_code().and_then(|code| self.groupes.get(&code)) {
            let code = groupe.code_groupe.as_ref().map(|v| v.to_string());
            sheet.set(c.code_groupe, row, code.as_deref().unwrap_or(MISSING));
            sheet.set(c.nom_groupe, row, groupe.nom_groupe.as_deref().unwrap_or(MISSING));
            sheet.set(c.etendu_groupe, row, groupe.etendu_groupe.as_deref().unwrap_or(MISSING));
        }

        let totals = code
            .as_ref()
            .and_then(|code| self.absences.get(code))
            .cloned()
            .unwrap_or_default();
        let (justified, unjustified, delays) = totals.formatted();
        sheet.set(c.duree_justifie, row, &justified);
        sheet.set(c.duree_non_justifie, row, &unjustified);
        sheet.set(c.duree_retard, row, &delays);
    }

    fn write_remarks<S: MergeSheet>(&self, sheet: &mut S) -> usize {
        let mut written = 0;
        for row in TEMPLATE_HEADER_ROW + 1..=sheet.height() {
            let name = sheet.value(self.columns.name_template, row);
            if name.is_empty() {
                continue;
            }
            if let Some(remark) = self.remarks.lookup(&name) {
                sheet.set(self.columns.appreciation, row, remark);
                written += 1;
            }
        }
        written
    }
}

/// `(uploaded column, template column)` pairs whose titles normalise equally.
///
/// Uploaded columns are 0-based, template columns 1-based.
fn matching_columns<S: MergeSheet>(uploaded: &SheetGrid, template: &S) -> Vec<(usize, u32)> {
    let header = UPLOADED_HEADER_ROW as usize - 1;
    let mut uploaded_titles: HashMap<String, usize> = HashMap::new();
    for (col, value) in uploaded.row(header).iter().enumerate() {
        if !value.is_empty() {
            uploaded_titles.insert(normalize_title(value), col);
        }
    }

    let mut template_titles: HashMap<String, u32> = HashMap::new();
    for col in 1..=template.width() {
        let value = template.value(col, TEMPLATE_HEADER_ROW);
        if !value.is_empty() {
            template_titles.insert(normalize_title(&value), col);
        }
    }

    let mut pairs: Vec<(usize, u32)> = uploaded_titles
        .iter()
        .filter_map(|(title, src)| template_titles.get(title).map(|dest| (*src, *dest)))
        .collect();
    pairs.sort_by_key(|(_, dest)| *dest);
    pairs
}

/// Drops repeated sub-headers and the absence disclaimer.
fn clean_template<S: MergeSheet>(sheet: &mut S) {
    let width = sheet.width();
    let height = sheet.height();

    for col in 1..=width {
        let second = sheet.value(col, TEMPLATE_HEADER_ROW + 1);
        if !second.is_empty() && second == sheet.value(col, TEMPLATE_HEADER_ROW) {
            sheet.clear(col, TEMPLATE_HEADER_ROW + 1);
        }
        if sheet.value(col, TEMPLATE_HEADER_ROW + 2) == SUBHEADER {
            sheet.clear(col, TEMPLATE_HEADER_ROW + 2);
        }
    }

    for row in 1..=height {
        for col in 1..=width {
            if sheet.value(col, row) == ABSENCE_DISCLAIMER {
                sheet.clear(col, row);
            }
        }
    }
}

/// Reads the template workbook, merges into its first sheet and saves the result.
pub fn merge_workbook(
    stage: &MergeStage<'_>,
    uploaded: &SheetGrid,
    template_path: &Path,
    output_path: &Path,
) -> BulletinResult<MergeSummary> {
    let mut book = umya_spreadsheet::reader::xlsx::read(template_path).map_err(|e| {
        BulletinError::configuration(format!(
            "Cannot read merge template {}: {:?}",
            template_path.display(),
            e
        ))
    })?;

    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| BulletinError::configuration("Merge template has no sheet"))?;
    let summary = stage.merge(uploaded, sheet)?;

    umya_spreadsheet::writer::xlsx::write(&book, output_path).map_err(|e| {
        BulletinError::internal(format!("Cannot write {}: {:?}", output_path.display(), e))
    })?;

    Ok(summary)
}
