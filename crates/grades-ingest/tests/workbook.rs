use std::path::Path;

use grades_ingest::{IngestError, LoadOptions, load_dataset, read_table};
use grades_model::{CellValue, Dataset, ErrorKind, PipelineConfig};
use rust_xlsxwriter::Workbook;

fn write_notes_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Notes").expect("sheet name");
    for (col, header) in ["StudentID", "ModuleName", "ElementName", "Grade"]
        .iter()
        .enumerate()
    {
        sheet
            .write_string(0, col as u16, *header)
            .expect("write header");
    }
    let rows = [
        ("21010395", "GINF31 Programmation oriente objet et XML", "XML et Applications", Some(14.0)),
        ("21010395", "GINF31 Programmation oriente objet et XML", "Programation orientee objet en JAVA", Some(9.0)),
        ("21010278", "GINF35 administration et programmation sys", "programmation systeme", None),
    ];
    for (idx, (student, module, element, grade)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, *student).expect("write id");
        sheet.write_string(row, 1, *module).expect("write module");
        sheet.write_string(row, 2, *element).expect("write element");
        if let Some(grade) = grade {
            sheet.write_number(row, 3, *grade).expect("write grade");
        }
    }
    workbook.save(path).expect("save workbook");
}

#[test]
fn reads_first_worksheet() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Notes.xlsx");
    write_notes_workbook(&path);

    let table = read_table(&path, &LoadOptions::default()).expect("read workbook");
    assert_eq!(table.width(), 4);
    assert_eq!(table.height(), 3);
    let first = table.record(0).expect("first row");
    assert_eq!(first.get("Grade").map(CellValue::to_text).as_deref(), Some("14"));
    assert_eq!(
        first.get("ElementName"),
        Some(&CellValue::from("XML et Applications"))
    );
    let last = table.record(2).expect("last row");
    assert_eq!(last.get("Grade"), Some(&CellValue::Empty));
}

#[test]
fn named_sheet_must_exist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Notes.xlsx");
    write_notes_workbook(&path);

    let options = LoadOptions {
        sheet: Some("Grades".to_string()),
    };
    let error = read_table(&path, &options).expect_err("missing sheet");
    assert!(matches!(error, IngestError::SheetNotFound { .. }));

    let options = LoadOptions {
        sheet: Some("Notes".to_string()),
    };
    assert_eq!(read_table(&path, &options).expect("named sheet").height(), 3);
}

#[test]
fn corrupt_workbook_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Modules.xlsx");
    std::fs::write(&path, b"not a zip archive").expect("write file");
    let error = read_table(&path, &LoadOptions::default()).expect_err("corrupt workbook");
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
fn dataset_prefers_spreadsheet_over_csv() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PipelineConfig::from_data_dir(dir.path());
    std::fs::create_dir_all(&config.input_dir).expect("input dir");
    write_notes_workbook(&config.input_dir.join("Notes.xlsx"));
    std::fs::write(
        config.input_dir.join("Notes.csv"),
        "StudentID,Grade\n1,2\n",
    )
    .expect("write csv");

    let table = load_dataset(&config, Dataset::Notes).expect("load notes");
    assert_eq!(table.width(), 4);
}
