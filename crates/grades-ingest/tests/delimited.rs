use std::fs;

use grades_ingest::{IngestError, LoadOptions, read_table};
use grades_model::{CellValue, ErrorKind};

#[test]
fn reads_header_and_rows_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Notes.csv");
    fs::write(
        &path,
        "StudentID,ModuleName,ElementName,Grade\n\
         21010395,GINF31 Programmation oriente objet et XML,XML et Applications,14\n\
         \n\
         21010278,GINF31 Programmation oriente objet et XML,Programation orientee objet en JAVA,\n",
    )
    .expect("write csv");

    let table = read_table(&path, &LoadOptions::default()).expect("read csv");
    assert_eq!(
        table.headers,
        vec!["StudentID", "ModuleName", "ElementName", "Grade"]
    );
    assert_eq!(table.height(), 2);
    let first = table.record(0).expect("first row");
    assert_eq!(first.get("StudentID"), Some(&CellValue::from("21010395")));
    assert_eq!(first.get("Grade"), Some(&CellValue::from("14")));
    let second = table.record(1).expect("second row");
    assert_eq!(second.get("Grade"), Some(&CellValue::Empty));
}

#[test]
fn short_rows_are_padded() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Students.csv");
    fs::write(&path, "StudentID,LastName,FirstName\n21010395,Alaoui\n").expect("write csv");

    let table = read_table(&path, &LoadOptions::default()).expect("read csv");
    let record = table.record(0).expect("row");
    assert_eq!(record.values().len(), 3);
    assert_eq!(record.get("FirstName"), Some(&CellValue::Empty));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let error = read_table(&dir.path().join("Absent.csv"), &LoadOptions::default())
        .expect_err("missing file");
    assert!(matches!(error, IngestError::FileNotFound { .. }));
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn empty_source_has_no_header() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Modules.csv");
    fs::write(&path, "\n , \n").expect("write csv");
    let error = read_table(&path, &LoadOptions::default()).expect_err("empty source");
    assert!(matches!(error, IngestError::NoHeaderRow { .. }));
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
fn unknown_extension_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Notes.json");
    fs::write(&path, "[]").expect("write file");
    let error = read_table(&path, &LoadOptions::default()).expect_err("unsupported");
    assert!(matches!(error, IngestError::UnsupportedFormat { .. }));
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
fn cell_text_is_kept_verbatim() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Students.csv");
    fs::write(
        &path,
        " StudentID ,LastName,Note\n21010395,\"  El Alami \",\"   \"\n21010278,Bennani,\n",
    )
    .expect("write csv");

    let table = read_table(&path, &LoadOptions::default()).expect("read csv");
    assert_eq!(table.headers, vec!["StudentID", "LastName", "Note"]);
    let first = table.record(0).expect("first row");
    assert_eq!(first.get("LastName"), Some(&CellValue::from("  El Alami ")));
    assert_eq!(first.get("Note"), Some(&CellValue::from("   ")));
    let second = table.record(1).expect("second row");
    assert_eq!(second.get("Note"), Some(&CellValue::Empty));
}
