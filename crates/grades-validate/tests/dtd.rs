//! DTD validation against the bundled dataset schemas.

use std::fs;
use std::path::{Path, PathBuf};

use grades_model::{Dataset, ErrorKind, PipelineConfig, SchemaKind, ValidationResult};
use grades_validate::{DtdValidator, ValidateError, validate_all, validate_document};

fn schema_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/schemas")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn render(result: &ValidationResult) -> String {
    result
        .issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

const VALID_NOTES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<Root>
  <Notes>
    <StudentID>21010395</StudentID>
    <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
    <ElementName>XML et Applications</ElementName>
    <Grade>14</Grade>
  </Notes>
  <Notes>
    <StudentID>21010395</StudentID>
    <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
    <ElementName>Programation orientee objet en JAVA</ElementName>
    <Grade/>
  </Notes>
</Root>
";

const INVALID_NOTES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<Root>
  <Notes>
    <StudentID>21010395</StudentID>
    <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
    <Grade>14</Grade>
  </Notes>
  <Notes>
    <StudentID>21010278</StudentID>
    <ModuleName>GINF31 Programmation oriente objet et XML</ModuleName>
    <ElementName>XML et Applications</ElementName>
    <Grade>12</Grade>
    <Comment>late</Comment>
  </Notes>
  stray
</Root>
";

#[test]
fn valid_notes_document_passes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "Notes_GInf2.xml", VALID_NOTES);
    let result = validate_document(&document, &schema_dir().join("Notes.dtd"), SchemaKind::Dtd)
        .expect("validate");
    assert!(result.valid, "unexpected issues:\n{}", render(&result));
    assert_eq!(result.kind, SchemaKind::Dtd);
}

#[test]
fn invalid_notes_collects_every_issue() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "Notes_GInf2.xml", INVALID_NOTES);
    let result = validate_document(&document, &schema_dir().join("Notes.dtd"), SchemaKind::Dtd)
        .expect("validate");
    assert!(!result.valid);
    insta::assert_snapshot!(render(&result), @r"
    line 2: element 'Root' has character data but allows only elements (Notes*)
    line 6: element 'Grade' is not expected in 'Notes'; expected 'ElementName'
    line 13: element 'Comment' is not expected in 'Notes'; expected no more elements
    line 13: element 'Comment' is not declared
    ");
}

#[test]
fn validation_is_deterministic() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "Notes_GInf2.xml", INVALID_NOTES);
    let validator = DtdValidator::from_file(&schema_dir().join("Notes.dtd")).expect("compile");
    let first = validator.validate(&document).expect("first run");
    let second = validator.validate(&document).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn attribute_rules_are_enforced() {
    let dtd = r#"<!ELEMENT catalog (module+)>
<!ELEMENT module (title, prerequisite*)>
<!ATTLIST module
  code ID #REQUIRED
  semester (S3|S4) #IMPLIED
  version CDATA #FIXED "1">
<!ELEMENT title (#PCDATA)>
<!ELEMENT prerequisite EMPTY>
<!ATTLIST prerequisite ref IDREF #REQUIRED>
"#;
    let xml = r#"<catalog>
  <module code="GINF31" semester="S3">
    <title>XML</title>
    <prerequisite ref="GINF99"/>
  </module>
  <module code="GINF31" semester="S5" version="2" lang="fr">
    <title>Java</title>
    <prerequisite ref="GINF31">x</prerequisite>
  </module>
  <module semester="S4">
    <title>UML</title>
  </module>
</catalog>
"#;
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "catalog.xml", xml);
    let validator = DtdValidator::from_text(dtd, Path::new("catalog.dtd")).expect("compile");
    let result = validator.validate(&document).expect("validate");
    insta::assert_snapshot!(render(&result), @r#"
    line 6: attribute 'version' of element 'module' must be "1", found "2"
    line 6: duplicate ID "GINF31"
    line 6: attribute 'semester' of element 'module' is not one of (S3|S4): "S5"
    line 6: attribute 'lang' of element 'module' is not declared
    line 8: element 'prerequisite' is declared EMPTY but has content
    line 10: element 'module' is missing required attribute 'code'
    line 4: IDREF "GINF99" does not match any ID
    "#);
}

#[test]
fn missing_schema_is_a_schema_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "Notes_GInf2.xml", VALID_NOTES);
    let error = validate_document(&document, &dir.path().join("Notes.dtd"), SchemaKind::Dtd)
        .expect_err("missing schema");
    assert!(matches!(error, ValidateError::SchemaNotFound { .. }));
    assert_eq!(error.kind(), ErrorKind::Schema);
}

#[test]
fn malformed_schema_is_distinct_from_invalid_document() {
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "Notes_GInf2.xml", INVALID_NOTES);
    let schema = write(
        dir.path(),
        "Notes.dtd",
        "<!ELEMENT Root (Notes*)>\n<!ELEMENT Notes (StudentID,,Grade)>\n",
    );
    let error = validate_document(&document, &schema, SchemaKind::Dtd).expect_err("bad schema");
    match &error {
        ValidateError::InvalidSchema { line, .. } => assert_eq!(*line, Some(2)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(error.kind(), ErrorKind::Schema);
}

#[test]
fn document_errors_are_classified() {
    let dir = tempfile::tempdir().expect("temp dir");
    let schema = schema_dir().join("Notes.dtd");

    let missing = validate_document(&dir.path().join("absent.xml"), &schema, SchemaKind::Dtd)
        .expect_err("missing document");
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let broken = write(dir.path(), "broken.xml", "<Root>\n  <Notes>\n</Root>\n");
    let malformed =
        validate_document(&broken, &schema, SchemaKind::Dtd).expect_err("malformed document");
    assert_eq!(malformed.kind(), ErrorKind::Parse);
}

#[test]
fn validate_all_reports_each_dataset() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = PipelineConfig::from_data_dir(dir.path());
    config.schema_dir = schema_dir();
    fs::create_dir_all(&config.xml_dir).expect("xml dir");
    fs::write(config.xml_path(Dataset::Notes), VALID_NOTES).expect("write notes");
    fs::write(
        config.xml_path(Dataset::Students),
        "<?xml version=\"1.0\"?>\n<Root>\n  <Students>\n    <StudentID>21010395</StudentID>\n  </Students>\n</Root>\n",
    )
    .expect("write students");

    let outcomes = validate_all(&config, &Dataset::ALL, &[SchemaKind::Dtd]);
    assert_eq!(outcomes.len(), 3);

    let students = &outcomes[0];
    assert_eq!(students.dataset, Dataset::Students);
    let result = students.result.as_ref().expect("students validated");
    assert!(!result.valid);
    assert_eq!(result.issues[0].line, Some(3));

    let modules = outcomes[1].result.as_ref().expect_err("modules document missing");
    assert_eq!(modules.kind(), ErrorKind::NotFound);

    let notes = outcomes[2].result.as_ref().expect("notes validated");
    assert!(notes.valid);
}

#[test]
fn tokenized_attribute_values_are_normalized() {
    let dtd = r#"<!ELEMENT catalog (module+)>
<!ELEMENT module (prerequisite*)>
<!ATTLIST module
  code ID #REQUIRED
  semester (S3|S4) #IMPLIED
  tags NMTOKENS #IMPLIED
  level NMTOKEN #FIXED "L2"
  title CDATA #FIXED "XML">
<!ELEMENT prerequisite EMPTY>
<!ATTLIST prerequisite refs IDREFS #REQUIRED>
"#;
    let xml = r#"<catalog>
  <module code="  GINF31 " semester=" S3 " tags=" xml   java " level=" L2">
    <prerequisite refs=" GINF32    GINF31 "/>
  </module>
  <module code="GINF32" title=" XML ">
    <prerequisite refs="GINF31"/>
  </module>
</catalog>
"#;
    let dir = tempfile::tempdir().expect("temp dir");
    let document = write(dir.path(), "catalog.xml", xml);
    let validator = DtdValidator::from_text(dtd, Path::new("catalog.dtd")).expect("compile");
    let result = validator.validate(&document).expect("validate");
    insta::assert_snapshot!(render(&result), @r#"line 5: attribute 'title' of element 'module' must be "XML", found " XML ""#);
}
