use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("depmark")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("xlsx/xlsm workbook"));
}

#[test]
fn legacy_xls_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.xls");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();

    Command::cargo_bin("depmark")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn missing_input_reports_the_path() {
    Command::cargo_bin("depmark")
        .unwrap()
        .arg("/no/such/workbook.xlsx")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("book.xlsx");
    std::fs::write(&book, vec![0u8; 64]).unwrap();
    let config = dir.path().join("policy.json");
    std::fs::write(&config, b"{not json").unwrap();

    Command::cargo_bin("depmark")
        .unwrap()
        .arg(&book)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
