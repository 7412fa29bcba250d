//! Tests for grades-model types.

use std::path::PathBuf;

use grades_model::{
    CellValue, ConfigFile, Dataset, ModuleCatalog, PipelineConfig, SchemaKind, Table,
    ValidationIssue, ValidationResult, report_file_stem,
};

#[test]
fn config_layout_follows_data_dir() {
    let config = PipelineConfig::from_data_dir("/srv/grades");
    assert_eq!(
        config.xml_path(Dataset::Notes),
        PathBuf::from("/srv/grades/output/xml/Notes_GInf2.xml")
    );
    assert_eq!(
        config.schema_path(Dataset::Modules, SchemaKind::Xsd),
        PathBuf::from("/srv/grades/schemas/Modules.xsd")
    );
    assert_eq!(
        config.stylesheet,
        PathBuf::from("/srv/grades/xslt/GradesReport.xsl")
    );
    assert_eq!(config.document_spec(Dataset::Students).record_element, "Students");
    assert_eq!(config.document_spec(Dataset::Students).root_element, "Root");
}

#[test]
fn config_file_overrides_relative_to_data_dir() {
    let file: ConfigFile = serde_json::from_str(
        r#"{"cohort": "GInf3", "paths": {"xml_dir": "xml", "stylesheet": "/opt/report.xsl"}}"#,
    )
    .expect("parse config");
    let mut config = PipelineConfig::from_data_dir("/srv/grades");
    config.apply(&file);
    assert_eq!(
        config.xml_path(Dataset::Students),
        PathBuf::from("/srv/grades/xml/Students_GInf3.xml")
    );
    assert_eq!(config.stylesheet, PathBuf::from("/opt/report.xsl"));
    assert_eq!(config.html_dir, PathBuf::from("/srv/grades/output/html"));
}

#[test]
fn report_names_are_deterministic() {
    let stem = report_file_stem("GINF35 administration et programmation sys");
    insta::assert_snapshot!(stem, @"GradesReport_GINF35_administration_et_programmation_sys");
    assert_eq!(
        stem,
        report_file_stem("GINF35 administration et programmation sys")
    );
    let suffix = stem.trim_start_matches("GradesReport_");
    assert!(suffix.chars().all(|ch| ch.is_alphanumeric() || ch == '_'));

    let config = PipelineConfig::from_data_dir("data");
    assert_eq!(
        config.pdf_report_path("GINF43 traitement de l'image"),
        PathBuf::from("data/output/pdf/GradesReport_GINF43_traitement_de_l_image.pdf")
    );
}

#[test]
fn catalog_is_distinct_and_ordered() {
    let catalog = ModuleCatalog::new([
        "GINF31 Programmation oriente objet et XML",
        "",
        "GINF32 qualite et approche processus",
        "GINF31 Programmation oriente objet et XML",
        "   ",
    ]);
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.select(2).map(|filter| filter.to_string()),
        Some("GINF32 qualite et approche processus".to_string())
    );
    assert!(catalog.select(0).is_none());
    assert!(catalog.select(3).is_none());
    assert!(catalog.filter_for("GINF99 unknown").is_none());
    assert!(catalog.filter_for(" GINF32 qualite et approche processus ").is_some());
}

#[test]
fn table_pads_short_rows() {
    let mut table = Table::new(vec!["StudentID".into(), "Grade".into()]);
    table.push_row(vec![CellValue::from("21010395")]);
    table.push_row(vec!["21010278".into(), 12_i64.into(), "extra".into()]);
    assert_eq!(table.height(), 2);
    let first = table.record(0).expect("first record");
    assert_eq!(first.get("Grade"), Some(&CellValue::Empty));
    let second = table.record(1).expect("second record");
    assert_eq!(second.values().len(), 2);
    assert_eq!(second.get("Grade").map(CellValue::to_text).as_deref(), Some("12"));
}

#[test]
fn validation_result_serializes() {
    let result = ValidationResult::new(
        "Notes_GInf2.xml",
        "Notes.dtd",
        SchemaKind::Dtd,
        vec![ValidationIssue::new(Some(4), "element 'Grade' is not declared")],
    );
    assert!(!result.valid);
    let json = serde_json::to_value(&result).expect("serialize result");
    assert_eq!(json["kind"], "dtd");
    assert_eq!(json["issues"][0]["line"], 4);
    assert_eq!(
        result.issues[0].to_string(),
        "line 4: element 'Grade' is not declared"
    );
}
