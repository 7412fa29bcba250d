//! Tests for XML document generation.

use std::fs;

use grades_model::{
    CellValue, Dataset, DocumentSpec, ErrorKind, PipelineConfig, Table, element_name_for_column,
};
use grades_output::{
    OutputError, convert_all, convert_dataset, serialize_table, write_document,
};
use proptest::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;

type Field = (String, Option<String>);

/// Parse a generated document back into records of (element, text) pairs.
fn read_back(bytes: &[u8]) -> (Option<String>, Vec<Vec<Field>>) {
    let mut reader = Reader::from_reader(bytes);
    let mut root = None;
    let mut records: Vec<Vec<Field>> = Vec::new();
    let mut field: Option<(String, String)> = None;
    let mut depth = 0;
    loop {
        match reader.read_event().expect("well-formed document") {
            Event::Start(start) => {
                depth += 1;
                let name = String::from_utf8(start.name().as_ref().to_vec()).expect("utf-8 name");
                match depth {
                    1 => root = Some(name),
                    2 => records.push(Vec::new()),
                    3 => field = Some((name, String::new())),
                    _ => panic!("unexpected nesting at {name}"),
                }
            }
            Event::Empty(start) => {
                let name = String::from_utf8(start.name().as_ref().to_vec()).expect("utf-8 name");
                match depth {
                    0 => root = Some(name),
                    2 => records.last_mut().expect("record").push((name, None)),
                    _ => panic!("unexpected empty element {name}"),
                }
            }
            Event::Text(text) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&reader.decoder().decode(&text).expect("utf-8 text"));
                }
            }
            Event::GeneralRef(reference) => {
                let name = reader.decoder().decode(&reference).expect("utf-8 ref");
                let resolved = match name.as_ref() {
                    "amp" => "&",
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    "apos" => "'",
                    other => panic!("unexpected entity {other}"),
                };
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(resolved);
                }
            }
            Event::End(_) => {
                if depth == 3 {
                    let (name, value) = field.take().expect("open field");
                    records.last_mut().expect("record").push((name, Some(value)));
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    (root, records)
}

fn notes_spec() -> DocumentSpec {
    DocumentSpec::new("Root", "Notes")
}

fn table_strategy() -> impl Strategy<Value = Table> {
    prop::collection::vec("[A-Za-z][A-Za-z0-9 /]{0,8}", 1..5).prop_flat_map(|headers| {
        let width = headers.len();
        let cell = prop::option::of("[a-zA-Z0-9 &<>'\"é]{1,12}");
        prop::collection::vec(prop::collection::vec(cell, width), 0..6).prop_map(move |rows| {
            let mut table = Table::new(headers.clone());
            for row in rows {
                table.push_row(row.into_iter().map(CellValue::from).collect());
            }
            table
        })
    })
}

proptest! {
    #[test]
    fn document_mirrors_table(table in table_strategy()) {
        let bytes = serialize_table(&table, &notes_spec()).expect("serialize");
        let (root, records) = read_back(&bytes);
        prop_assert_eq!(root.as_deref(), Some("Root"));
        prop_assert_eq!(records.len(), table.height());

        let names: Vec<String> = table
            .headers
            .iter()
            .map(|header| element_name_for_column(header).expect("valid name"))
            .collect();
        for (record, row) in records.iter().zip(table.rows()) {
            let expected: Vec<Field> = names
                .iter()
                .cloned()
                .zip(row.iter().map(|value| (!value.is_empty()).then(|| value.to_text())))
                .collect();
            prop_assert_eq!(record, &expected);
        }
    }

    #[test]
    fn serialization_is_deterministic(table in table_strategy()) {
        let first = serialize_table(&table, &notes_spec()).expect("serialize");
        let second = serialize_table(&table, &notes_spec()).expect("serialize");
        prop_assert_eq!(first, second);
    }
}

#[test]
fn notes_document_layout() {
    let mut table = Table::new(vec![
        "StudentID".into(),
        "ModuleName".into(),
        "Element Name".into(),
        "Grade".into(),
    ]);
    table.push_row(vec![
        "21010395".into(),
        "GINF31 Programmation oriente objet et XML".into(),
        "XML & Applications".into(),
        14_i64.into(),
    ]);
    table.push_row(vec![
        "21010395".into(),
        "GINF31 Programmation oriente objet et XML".into(),
        "Programation orientee objet en JAVA".into(),
        CellValue::Empty,
    ]);

    let bytes = serialize_table(&table, &notes_spec()).expect("serialize");
    let xml = String::from_utf8(bytes).expect("utf-8");
    insta::assert_snapshot!(xml.trim_end(), @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <Root>
      <Notes>
        <StudentID>21010395</StudentID>
        <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
        <Element_Name>XML &amp; Applications</Element_Name>
        <Grade>14</Grade>
      </Notes>
      <Notes>
        <StudentID>21010395</StudentID>
        <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
        <Element_Name>Programation orientee objet en JAVA</Element_Name>
        <Grade/>
      </Notes>
    </Root>
    "#);
}

#[test]
fn invalid_column_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Notes_GInf2.xml");
    let mut table = Table::new(vec!["StudentID".into(), "2024 Grade".into()]);
    table.push_row(vec!["21010395".into(), "12".into()]);

    let error = write_document(&table, &notes_spec(), &path).expect_err("invalid column");
    assert!(matches!(error, OutputError::InvalidColumn(_)));
    assert_eq!(error.kind(), ErrorKind::Parse);
    assert!(!path.exists());
}

#[test]
fn unwritable_destination_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("xml");
    fs::write(&blocker, b"not a directory").expect("seed blocker");
    let table = Table::new(vec!["StudentID".into()]);

    let error = write_document(&table, &notes_spec(), &blocker.join("Students.xml"))
        .expect_err("destination under a file");
    assert!(matches!(error, OutputError::Write { .. }));
    assert_eq!(error.kind(), ErrorKind::Io);
}

#[test]
fn rewrite_replaces_previous_document() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Modules_GInf2.xml");
    fs::write(&path, b"stale").expect("seed");
    let mut table = Table::new(vec!["MODULENAME".into()]);
    table.push_row(vec!["GINF31 Programmation oriente objet et XML".into()]);

    let written = write_document(&table, &DocumentSpec::new("Root", "Modules"), &path)
        .expect("write document");
    let contents = fs::read(&path).expect("read back");
    assert_eq!(contents.len(), written);
    assert!(contents.starts_with(b"<?xml"));
}

#[test]
fn converts_datasets_from_input_dir() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PipelineConfig::from_data_dir(dir.path());
    fs::create_dir_all(&config.input_dir).expect("input dir");
    fs::write(
        config.input_dir.join("Students.csv"),
        "StudentID,LastName,FirstName\n21010395,Alaoui,Sara\n21010278,Bennani,Omar\n",
    )
    .expect("write students");

    let summary = convert_dataset(&config, Dataset::Students).expect("convert students");
    assert_eq!(summary.records, 2);
    assert_eq!(summary.columns, 3);
    assert_eq!(summary.output, config.xml_path(Dataset::Students));
    let (_, records) = read_back(&fs::read(&summary.output).expect("read output"));
    assert_eq!(
        records[1][0],
        ("StudentID".to_string(), Some("21010278".to_string()))
    );

    let outcomes = convert_all(&config, &Dataset::ALL);
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].1.is_ok());
    let missing = outcomes[2].1.as_ref().expect_err("notes source missing");
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    assert!(!config.xml_path(Dataset::Notes).exists());
}

#[test]
fn converted_values_keep_surrounding_whitespace() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PipelineConfig::from_data_dir(dir.path());
    fs::create_dir_all(&config.input_dir).expect("input dir");
    fs::write(
        config.input_dir.join("Students.csv"),
        "StudentID,LastName,Note\n21010395,\"  El Alami \",\"   \"\n21010278,Bennani,\n",
    )
    .expect("write students");

    let summary = convert_dataset(&config, Dataset::Students).expect("convert students");
    let (_, records) = read_back(&fs::read(&summary.output).expect("read output"));
    assert_eq!(
        records[0],
        vec![
            ("StudentID".to_string(), Some("21010395".to_string())),
            ("LastName".to_string(), Some("  El Alami ".to_string())),
            ("Note".to_string(), Some("   ".to_string())),
        ]
    );
    assert_eq!(records[1][2], ("Note".to_string(), None));
}
