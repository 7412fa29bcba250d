//! End-to-end runs of the `gradebook` binary over a copy of the bundled data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bundled(dir: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data").join(dir)
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("create dir");
    for entry in fs::read_dir(from).expect("read dir") {
        let entry = entry.expect("dir entry");
        fs::copy(entry.path(), to.join(entry.file_name())).expect("copy file");
    }
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for name in ["input", "schemas", "xslt"] {
        copy_dir(&bundled(name), &dir.path().join(name));
    }
    dir
}

fn gradebook(data: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gradebook"))
        .arg("--data-dir")
        .arg(data)
        .arg("--color")
        .arg("never")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run gradebook")
}

#[test]
fn convert_validate_and_report() {
    let data = data_dir();

    let output = gradebook(data.path(), &["convert"]);
    assert!(output.status.success(), "{output:?}");
    for name in ["Students_GInf2.xml", "Modules_GInf2.xml", "Notes_GInf2.xml"] {
        assert!(data.path().join("output/xml").join(name).is_file(), "{name}");
    }

    let report = data.path().join("validation.json");
    let output = gradebook(
        data.path(),
        &["validate", "--kind", "dtd", "--report", report.to_str().expect("utf-8 path")],
    );
    assert!(output.status.success(), "{output:?}");
    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(&report).expect("report")).expect("json");
    assert_eq!(json["valid"], true);
    assert_eq!(json["entries"].as_array().map(Vec::len), Some(3));

    let output = gradebook(data.path(), &["modules"]);
    assert!(output.status.success(), "{output:?}");
    let listing = String::from_utf8_lossy(&output.stdout);
    assert!(listing.contains("GINF31 Programmation oriente objet et XML"));

    let output = gradebook(data.path(), &["report", "--module-index", "1", "--html-only"]);
    assert!(output.status.success(), "{output:?}");
    let html = data
        .path()
        .join("output/html/GradesReport_GINF31_Programmation_oriente_objet_et_XML.html");
    let html = fs::read_to_string(html).expect("html report");
    assert!(html.contains("grade-row"));
    assert!(!data.path().join("output/pdf").exists());
}

#[test]
fn unknown_module_fails() {
    let data = data_dir();
    assert!(gradebook(data.path(), &["convert", "--dataset", "modules"]).status.success());
    let output = gradebook(data.path(), &["report", "--module", "GINF99 inconnu"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("GINF99 inconnu"));
}

#[test]
fn missing_inputs_fail_conversion() {
    let dir = TempDir::new().expect("temp dir");
    let output = gradebook(dir.path(), &["convert"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("output/xml/Notes_GInf2.xml").exists());
}

#[test]
fn broken_schema_is_not_an_invalid_document() {
    let data = data_dir();
    assert!(gradebook(data.path(), &["convert", "--dataset", "notes"]).status.success());
    fs::write(data.path().join("schemas/Notes.dtd"), "<!ELEMENT Root (Notes*)\n").expect("dtd");
    let report = data.path().join("validation.json");
    let output = gradebook(
        data.path(),
        &[
            "validate",
            "--kind",
            "dtd",
            "--dataset",
            "notes",
            "--report",
            report.to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(&report).expect("report")).expect("json");
    assert_eq!(json["entries"][0]["status"], "error");
    assert!(
        json["entries"][0]["error"]
            .as_str()
            .is_some_and(|error| error.starts_with("schema error"))
    );
}
