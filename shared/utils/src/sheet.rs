//! Spreadsheet reading for uploaded exports.
//!
//! Uploads are read once into a [`SheetGrid`] of cell texts addressed by
//! absolute 0-based `(row, column)`, then mapped to student records.

use anyhow::Context;
use bulletin_models::StudentRecord;
use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
use std::io::Cursor;

use crate::error::{BulletinError, BulletinResult};
use crate::text::normalize_title;

/// Row holding the subject/unit titles in a grade export (C1..V1).
pub const TITLE_ROW: usize = 0;
pub const TITLE_COLUMNS: std::ops::Range<usize> = 2..22;
/// Row holding the identity column names.
pub const HEADER_ROW: usize = 1;
pub const FIRST_STUDENT_ROW: usize = 2;

/// Merge uploads carry their titles on row 4, every third column from C to BH.
pub const MERGE_TITLE_ROW: usize = 3;
pub const MERGE_TITLE_COLUMNS: [usize; 20] = [
    2, 5, 8, 11, 14, 17, 20, 23, 26, 29, 32, 35, 38, 41, 44, 47, 50, 53, 56, 59,
];

const GROUP_AVERAGE_MARKER: &str = "moyennedugroupe";

/// Cell texts of the first worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Reads the first sheet of an XLSX workbook.
    pub fn from_xlsx_bytes(data: &[u8]) -> BulletinResult<Self> {
        Self::read_xlsx(data).map_err(|e| BulletinError::spreadsheet(format!("{:#}", e)))
    }

    fn read_xlsx(data: &[u8]) -> anyhow::Result<Self> {
        let cursor = Cursor::new(data);
        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(cursor).context("Failed to open Excel workbook")?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .context("No sheets found in workbook")?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .context("Failed to read worksheet")??;

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
        for row in range.rows() {
            let mut cells = vec![String::new(); start_col as usize];
            cells.extend(row.iter().map(cell_text));
            rows.push(cells);
        }

        Ok(Self { rows })
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.row(row).get(column).map(String::as_str).unwrap_or("")
    }

    /// Title row of a grade export, trailing blanks dropped.
    pub fn export_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = TITLE_COLUMNS
            .map(|col| self.cell(TITLE_ROW, col).to_string())
            .collect();
        while titles.last().map_or(false, |t| t.trim().is_empty()) {
            titles.pop();
        }
        titles
    }

    /// Non-empty titles of a merge upload's fixed title cells.
    pub fn merge_titles(&self) -> Vec<String> {
        MERGE_TITLE_COLUMNS
            .iter()
            .map(|col| self.cell(MERGE_TITLE_ROW, *col))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True when some cell of the row is a "Moyenne du groupe" summary.
    pub fn is_group_average_row(&self, row: usize) -> bool {
        self.row(row)
            .iter()
            .any(|cell| normalize_title(cell).contains(GROUP_AVERAGE_MARKER))
    }
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::DateTime(_) => cell
            .as_date()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| cell.to_string()),
        DataType::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Maps grade-export rows to student records by literal header names.
pub struct StudentSheetReader {
    name_columns: Vec<String>,
    code_columns: Vec<String>,
    birth_date_columns: Vec<String>,
    site_columns: Vec<String>,
    group_name_columns: Vec<String>,
    group_extent_columns: Vec<String>,
    justified_columns: Vec<String>,
    unjustified_columns: Vec<String>,
    delay_columns: Vec<String>,
}

impl Default for StudentSheetReader {
    fn default() -> Self {
        let list = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        Self {
            name_columns: list(&["Nom", "Nom Apprenant", "NomApprenant"]),
            code_columns: list(&["CodeApprenant", "Code Apprenant"]),
            birth_date_columns: list(&["Date de Naissance", "DatedeNaissance"]),
            site_columns: list(&["Nom Site", "NomSite"]),
            group_name_columns: list(&["Nom Groupe", "NomGroupe"]),
            group_extent_columns: list(&["Étendu Groupe", "EtenduGroupe", "Etendu Groupe"]),
            justified_columns: list(&["ABS justifiées", "ABSjustifiées"]),
            unjustified_columns: list(&["ABS injustifiées", "ABSinjustifiées"]),
            delay_columns: list(&["Retards"]),
        }
    }
}

impl StudentSheetReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, grid: &SheetGrid) -> BulletinResult<Vec<StudentRecord>> {
        let headers = grid.row(HEADER_ROW);
        let name_col = find_column(headers, &self.name_columns).ok_or_else(|| {
            BulletinError::spreadsheet(format!(
                "Missing student name column (expected one of {:?} on row {})",
                self.name_columns,
                HEADER_ROW + 1
            ))
        })?;

        let code_col = find_column(headers, &self.code_columns);
        let birth_col = find_column(headers, &self.birth_date_columns);
        let site_col = find_column(headers, &self.site_columns);
        let group_col = find_column(headers, &self.group_name_columns);
        let extent_col = find_column(headers, &self.group_extent_columns);
        let justified_col = find_column(headers, &self.justified_columns);
        let unjustified_col = find_column(headers, &self.unjustified_columns);
        let delay_col = find_column(headers, &self.delay_columns);

        let text = |row: usize, col: Option<usize>| {
            col.map(|c| grid.cell(row, c).trim().to_string()).unwrap_or_default()
        };

        let mut records = Vec::new();
        for row in FIRST_STUDENT_ROW..grid.height() {
            let name = grid.cell(row, name_col).trim();
            if name.is_empty() || grid.is_group_average_row(row) {
                continue;
            }

            records.push(StudentRecord {
                row_number: row + 1,
                name: name.to_string(),
                code_apprenant: Some(text(row, code_col)).filter(|c| !c.is_empty()),
                birth_date: text(row, birth_col),
                site: text(row, site_col),
                group_name: text(row, group_col),
                group_extent: text(row, extent_col),
                justified_absences: text(row, justified_col),
                unjustified_absences: text(row, unjustified_col),
                delays: text(row, delay_col),
                cells: grid.row(row).to_vec(),
            });
        }

        tracing::debug!(count = records.len(), "Read student rows");
        Ok(records)
    }
}

fn find_column(headers: &[String], candidates: &[String]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h.trim() == candidate))
}
