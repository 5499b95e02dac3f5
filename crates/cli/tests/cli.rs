use assert_cmd::Command;
use std::path::Path;

fn libris(config_dir: &Path, data_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("libris").unwrap();
    cmd.env("LIBRIS_CONFIG_DIR", config_dir)
        .env("LIBRIS_STORAGE__DATA_PATH", data_path)
        .env_remove("LIBRIS_ENV")
        .env_remove("RUST_LOG");
    cmd
}

const CATALOG: &str = r#"[
  {"id": 1, "title": "Dune", "author": "Frank Herbert", "year": 1965,
   "available": true, "borrower": null, "returnDate": null},
  {"id": 2, "title": "Ubik", "author": "Philip K. Dick", "year": 1969,
   "available": false, "borrower": "Joe", "returnDate": "2001-01-01"}
]"#;

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = libris(dir.path(), &dir.path().join("books.json"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "list", "show", "check"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn list_overdue_prints_matching_books() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("books.json");
    std::fs::write(&data, CATALOG).unwrap();

    let output = libris(dir.path(), &data)
        .args(["list", "--filter", "overdue"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let books: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let books = books.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Ubik");
}

#[test]
fn show_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("books.json");
    std::fs::write(&data, CATALOG).unwrap();

    libris(dir.path(), &data)
        .args(["show", "1"])
        .assert()
        .success();
    libris(dir.path(), &data)
        .args(["show", "99"])
        .assert()
        .failure();
}

#[test]
fn check_reports_summary_and_inconsistencies() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("books.json");
    std::fs::write(&data, CATALOG).unwrap();

    let output = libris(dir.path(), &data).arg("check").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2 books, 1 borrowed, 1 overdue"));

    std::fs::write(
        &data,
        r#"[{"id": 1, "title": "A", "author": "B", "year": 1, "available": false,
             "borrower": null, "returnDate": null}]"#,
    )
    .unwrap();
    libris(dir.path(), &data).arg("check").assert().failure();
}

#[test]
fn check_rejects_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("books.json");
    std::fs::write(&data, "not json").unwrap();

    libris(dir.path(), &data).arg("check").assert().failure();
}
