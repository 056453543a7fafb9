use serde::{Deserialize, Serialize};

/// One student row of the administrative export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentRecord {
    pub row_number: usize,
    pub name: String,
    pub code_apprenant: Option<String>,
    pub birth_date: String,
    pub site: String,
    pub group_name: String,
    pub group_extent: String,
    pub justified_absences: String,
    pub unjustified_absences: String,
    pub delays: String,
    /// Raw text of every cell in the row, indexed by 0-based column.
    pub cells: Vec<String>,
}

impl StudentRecord {
    /// Raw cell text at a column, empty when the row is shorter.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let record = StudentRecord {
            cells: vec!["Dupont".to_string(), "12".to_string()],
            ..Default::default()
        };
        assert_eq!(record.cell(1), "12");
        assert_eq!(record.cell(7), "");
    }
}
