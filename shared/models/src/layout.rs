use serde::{Deserialize, Serialize};

/// Column structure of one program/semester export.
///
/// Subject positions are 1-based and follow the order of `subjects`.
/// `header` fields index into `export_titles`.
///
/// The grade export (row 1, C..V) and the merge upload (row 4, C4..BH4) are
/// produced by different tools and label some subjects differently, so each
/// carries its own title list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub key: String,
    pub program: String,
    pub semester: String,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub report_template: Option<String>,
    #[serde(default)]
    pub merge_template: Option<String>,
    pub export_titles: Vec<String>,
    /// Titles expected in the merge upload's fixed cells; empty when the
    /// layout does not take part in the merge.
    #[serde(default)]
    pub merge_titles: Vec<String>,
    pub units: Vec<UnitSpec>,
    pub subjects: Vec<SubjectSpec>,
    #[serde(default)]
    pub hidden_credits: Vec<usize>,
    #[serde(default)]
    pub merge_columns: Option<MergeColumns>,
}

/// Curriculum unit: a title and the subject positions it groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitSpec {
    pub name: String,
    pub header: usize,
    pub subjects: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectSpec {
    pub header: usize,
    /// 0-based column of the grade cell in a student row.
    pub column: usize,
}

/// 1-based column indices used by the spreadsheet merge stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeColumns {
    pub name_uploaded: u32,
    pub name_template: u32,
    pub code_apprenant: u32,
    pub date_naissance: u32,
    pub nom_site: u32,
    pub code_groupe: u32,
    pub nom_groupe: u32,
    pub etendu_groupe: u32,
    pub duree_justifie: u32,
    pub duree_non_justifie: u32,
    pub duree_retard: u32,
    pub appreciation: u32,
}

impl MergeColumns {
    /// Every configured column with its field name.
    pub fn indices(&self) -> [(&'static str, u32); 12] {
        [
            ("name_uploaded", self.name_uploaded),
            ("name_template", self.name_template),
            ("code_apprenant", self.code_apprenant),
            ("date_naissance", self.date_naissance),
            ("nom_site", self.nom_site),
            ("code_groupe", self.code_groupe),
            ("nom_groupe", self.nom_groupe),
            ("etendu_groupe", self.etendu_groupe),
            ("duree_justifie", self.duree_justifie),
            ("duree_non_justifie", self.duree_non_justifie),
            ("duree_retard", self.duree_retard),
            ("appreciation", self.appreciation),
        ]
    }
}

impl Layout {
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Subject at a 1-based position.
    pub fn subject(&self, position: usize) -> Option<&SubjectSpec> {
        position.checked_sub(1).and_then(|idx| self.subjects.get(idx))
    }

    pub fn subject_title(&self, position: usize) -> Option<&str> {
        self.subject(position)
            .and_then(|s| self.export_titles.get(s.header))
            .map(String::as_str)
    }

    pub fn unit_title(&self, unit: &UnitSpec) -> Option<&str> {
        self.export_titles.get(unit.header).map(String::as_str)
    }

    pub fn is_credit_hidden(&self, position: usize) -> bool {
        self.hidden_credits.contains(&position)
    }

    /// Iterates `(position, spec)` pairs in configured order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, &SubjectSpec)> {
        self.subjects.iter().enumerate().map(|(idx, s)| (idx + 1, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        Layout {
            key: "M2_S4_MAPI".to_string(),
            program: "MAPI".to_string(),
            semester: "S4".to_string(),
            filenames: vec![],
            report_template: None,
            merge_template: None,
            export_titles: vec!["UE 1".to_string(), "Economie".to_string(), "Droit".to_string()],
            merge_titles: vec![],
            units: vec![UnitSpec { name: "UE1".to_string(), header: 0, subjects: vec![1, 2] }],
            subjects: vec![
                SubjectSpec { header: 1, column: 3 },
                SubjectSpec { header: 2, column: 4 },
            ],
            hidden_credits: vec![2],
            merge_columns: None,
        }
    }

    #[test]
    fn test_positions_are_one_based() {
        let layout = sample();
        assert!(layout.subject(0).is_none());
        assert_eq!(layout.subject(1).map(|s| s.column), Some(3));
        assert_eq!(layout.subject_title(2), Some("Droit"));
        assert!(layout.subject(3).is_none());
        assert_eq!(layout.positions().map(|(p, _)| p).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_unit_title_and_hidden_credit() {
        let layout = sample();
        assert_eq!(layout.unit_title(&layout.units[0]), Some("UE 1"));
        assert!(layout.is_credit_hidden(2));
        assert!(!layout.is_credit_hidden(1));
    }
}
