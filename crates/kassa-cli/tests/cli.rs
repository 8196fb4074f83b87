//! End-to-end CLI tests against saved raw-lines dumps.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    for line in lines {
        writeln!(file, "{line}").expect("write line");
    }
    file
}

#[test]
fn parse_lines_text_output() {
    let file = write_lines(&[
        "ТОО Смолл",
        "ул. Жукова 7",
        "ПРОДАЖА",
        "1. Хлеб",
        "1 x 120 120",
        "ИТОГО: 120",
    ]);

    Command::cargo_bin("kassa")
        .expect("binary")
        .args(["parse", "--lines"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Хлеб"))
        .stdout(predicate::str::contains("120"));
}

#[test]
fn parse_lines_json_output() {
    let file = write_lines(&[
        "Magnum - Abay",
        "ул. Abay 1",
        "Состав чека",
        "1. Хлеб",
        "1 x 1 200",
        "Итого: 1200 тг",
    ]);

    let output = Command::cargo_bin("kassa")
        .expect("binary")
        .args(["parse", "--format", "json", "--lines"])
        .arg(file.path())
        .output()
        .expect("run");

    assert!(output.status.success());
    let receipt: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(receipt["items"][0]["name"], "Хлеб");
    assert_eq!(receipt["computed_total"], "1200");
    assert!(receipt.get("total_mismatch_warning").is_none());
}

#[test]
fn parse_lines_missing_section_fails() {
    let file = write_lines(&["ТОО Смолл", "просто текст"]);

    Command::cargo_bin("kassa")
        .expect("binary")
        .args(["parse", "--lines"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("зона покупок"));
}
