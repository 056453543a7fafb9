//! Checks the shipped layouts file against the grading pipeline.

use bulletin_utils::{
    build_placeholders, CreditTable, LayoutRegistry, LayoutSignal, SheetGrid, StudentSheetReader,
    UnitAggregator,
};
use std::path::PathBuf;

fn registry() -> LayoutRegistry {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/layouts.yaml");
    LayoutRegistry::load(&path).expect("shipped layouts load")
}

fn credits() -> CreditTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/credits.json");
    CreditTable::load(&path).expect("shipped credit table loads")
}

#[test]
fn test_every_program_and_semester_is_configured() {
    let registry = registry();
    assert_eq!(registry.len(), 12);

    for semester in ["M1_S1", "M1_S2", "M2_S3", "M2_S4"] {
        for program in ["MAPI", "MAGI", "MEFIM"] {
            let key = format!("{}_{}", semester, program);
            let layout = registry.get(&key).unwrap_or_else(|| panic!("missing {}", key));
            assert_eq!(layout.program, program);
            assert!(layout.merge_columns.is_some());
            assert_eq!(
                registry.resolve(LayoutSignal::Filename(&format!("{}.xlsx", key))).unwrap().key,
                key
            );
        }
    }
}

#[test]
fn test_title_lists_identify_a_single_layout() {
    let registry = registry();
    for layout in registry.iter() {
        let resolved = registry.resolve_by_export_titles(&layout.export_titles).unwrap();
        assert_eq!(resolved.key, layout.key);
        let resolved = registry.resolve_by_merge_titles(&layout.merge_titles).unwrap();
        assert_eq!(resolved.key, layout.key);
    }
}

#[test]
fn test_grade_export_title_row_resolves() {
    let row: Vec<String> = [
        "UE 1 – Economie & Gestion",
        "Stratégie et Solutions Immobilières",
        "Finance Immobilière",
        "Economie Immobilière I",
        "UE 2 – Droit",
        "Droit des Affaires et des Contrats",
        "UE 3 – Aménagement & Urbanisme",
        "Ville et Développements Urbains",
        "Politique de l'Habitat",
        "UE 4 – Compétences Professionnalisantes",
        "Real Estate English",
        "Les Rencontres de l'Immobilier",
        "ESPI Career Services",
        "ESPI Inside",
        "Immersion Professionnelle",
        "Projet Voltaire",
        "UE SPE – MAPI",
        "Etude Foncière",
        "Montage d'une Opération de Promotion Immobilière",
        "Acquisition et Dissociation du Foncier",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect();

    let registry = registry();
    assert_eq!(registry.resolve_by_export_titles(&row).unwrap().key, "M1_S1_MAPI");
    // The merge sheet words this subject "Rencontres de l'Immobilier".
    assert!(registry.resolve_by_merge_titles(&row).is_err());
}

#[test]
fn test_merge_row_with_trailing_cell_resolves() {
    let registry = registry();
    let layout = registry.get("M2_S4_MAPI").unwrap();
    assert_eq!(layout.merge_titles.len(), 15);

    let mut row = vec![String::new(); 64];
    for (idx, title) in layout.merge_titles.iter().enumerate() {
        row[2 + 3 * idx] = title.clone();
    }
    row[2 + 3 * 15] = "Date de naissance".to_string();
    let grid = SheetGrid::from_rows(vec![vec![], vec![], vec![], row.clone()]);

    assert_eq!(grid.merge_titles().len(), 16);
    assert_eq!(registry.resolve_by_merge_titles(&grid.merge_titles()).unwrap().key, "M2_S4_MAPI");

    row[2 + 3 * 14] = format!("{}s", layout.merge_titles[14]);
    let grid = SheetGrid::from_rows(vec![vec![], vec![], vec![], row]);
    assert!(registry.resolve_by_merge_titles(&grid.merge_titles()).is_err());
}

#[test]
fn test_titles_resolve_ignoring_accents_and_case() {
    let registry = registry();
    let titles: Vec<String> = registry
        .get("M1_S1_MEFIM")
        .unwrap()
        .export_titles
        .iter()
        .map(|t| t.replace('é', "e").to_uppercase())
        .collect();

    assert_eq!(registry.resolve_by_export_titles(&titles).unwrap().key, "M1_S1_MEFIM");

    let truncated = &titles[..titles.len() - 1];
    let err = registry.resolve_by_export_titles(truncated).unwrap_err();
    assert_eq!(err.error_code(), "NO_MATCHING_TEMPLATE");
}

#[test]
fn test_export_sheet_end_to_end() {
    let registry = registry();
    let layout = registry.get("M1_S1_MAPI").unwrap().clone();

    let width = 2 + layout.export_titles.len() + 6;
    let mut titles = vec![String::new(); width];
    let mut headers = vec![String::new(); width];
    for (idx, title) in layout.export_titles.iter().enumerate() {
        titles[2 + idx] = title.clone();
        headers[2 + idx] = "Note".to_string();
    }
    headers[0] = "CodeApprenant".to_string();
    headers[1] = "Nom".to_string();
    let identity = 2 + layout.export_titles.len();
    for (offset, name) in ["Date de Naissance", "Nom Site", "Nom Groupe", "ABS justifiées", "ABS injustifiées", "Retards"]
        .iter()
        .enumerate()
    {
        headers[identity + offset] = name.to_string();
    }

    let mut student = vec![String::new(); width];
    student[0] = "69992".to_string();
    student[1] = "DUPONT Marie".to_string();
    for (_, spec) in layout.positions() {
        student[spec.column] = "12(1) - 14(1)".to_string();
    }
    student[identity] = "02/03/2001".to_string();
    student[identity + 1] = "Paris".to_string();
    student[identity + 2] = "M1 MAPI".to_string();
    student[identity + 3] = "03h00".to_string();

    let mut group_average = vec![String::new(); width];
    group_average[1] = "Moyenne du groupe".to_string();

    let grid = SheetGrid::from_rows(vec![titles, headers, student, group_average]);
    assert_eq!(registry.resolve_by_export_titles(&grid.export_titles()).unwrap().key, layout.key);

    let records = StudentSheetReader::new().read(&grid).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.code_apprenant.as_deref(), Some("69992"));
    assert_eq!(record.site, "Paris");

    let credits = credits();
    let results = UnitAggregator::new(&layout, &credits).aggregate(record);
    assert!(results.subjects.iter().all(|s| (s.average - 13.0).abs() < 1e-9));
    let expected_total: u32 = (1..=layout.subject_count()).map(|p| credits.credit_for(p)).sum();
    assert_eq!(results.total_credits, expected_total);
    assert!((results.overall_average - 13.0).abs() < 1e-9);

    let map = build_placeholders(&layout, record, &results, "17/10/2026");
    assert_eq!(map.get_text("nomApprenant").as_deref(), Some("DUPONT Marie"));
    assert_eq!(map.get_text("note1").as_deref(), Some("13.00"));
    assert_eq!(map.get_text("matiere13").as_deref(), Some("Etude Foncière"));
    assert_eq!(map.get_text("UESPE_Title").as_deref(), Some("UE SPE – MAPI"));
    // Projet Voltaire
    assert_eq!(map.get_text("ECTS12").as_deref(), Some(""));
    assert_eq!(map.get_text("justifiee").as_deref(), Some("03h00"));
}
