//! Placeholder map assembly for report templates.

use bulletin_models::{Layout, PlaceholderMap, StudentRecord, StudentResults};

use crate::grading::round2;

/// Builds the flat map bound into a report template. Performs no I/O.
///
/// `today` is printed as-is in `datedujour`.
pub fn build_placeholders(
    layout: &Layout,
    record: &StudentRecord,
    results: &StudentResults,
    today: &str,
) -> PlaceholderMap {
    let mut map = PlaceholderMap::new();

    map.insert("nomApprenant", record.name.as_str());
    map.insert("codeApprenant", record.code_apprenant.clone().unwrap_or_default());
    map.insert("etendugroupe", record.group_extent.as_str());
    map.insert("dateNaissance", record.birth_date.as_str());
    map.insert("groupe", record.group_name.as_str());
    map.insert("campus", record.site.as_str());
    map.insert("justifiee", record.justified_absences.as_str());
    map.insert("injustifiee", record.unjustified_absences.as_str());
    map.insert("retard", record.delays.as_str());
    map.insert("datedujour", today);

    for unit in &layout.units {
        if let Some(title) = layout.unit_title(unit) {
            map.insert(format!("{}_Title", unit.name), title);
        }
    }
    for (position, _) in layout.positions() {
        if let Some(title) = layout.subject_title(position) {
            map.insert(format!("matiere{}", position), title);
        }
    }

    for subject in &results.subjects {
        let note = if subject.has_data() {
            format!("{:.2}", subject.average)
        } else {
            String::new()
        };
        map.insert(format!("note{}", subject.position), note);

        if subject.credits_hidden {
            map.insert(format!("ECTS{}", subject.position), "");
        } else {
            map.insert(format!("ECTS{}", subject.position), subject.credits);
        }
    }

    for unit in &results.units {
        map.insert(format!("moy{}", unit.name), unit.average);
        map.insert(format!("ECTS{}", unit.name), unit.credits);
    }

    map.insert("moyenneECTS", results.total_credits);
    map.insert("moyenne", round2(results.overall_average));

    map
}
