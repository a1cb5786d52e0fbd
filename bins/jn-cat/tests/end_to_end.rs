//! End-to-end smoke test: run the actual compiled binary over plain
//! files, exercising the full address-parse -> bridge -> NDJSON loop.

use std::io::Write;
use std::process::Command;

#[test]
fn streams_ndjson_from_one_file_to_another() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.ndjson");
    let output = dir.path().join("out.ndjson");
    std::fs::File::create(&input).unwrap().write_all(b"{\"a\":1}\n{\"a\":2}\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_jn-cat"))
        .arg(&input)
        .arg("--to")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(contents, "{\"a\":1}\n{\"a\":2}\n");
}

#[test]
fn skips_malformed_lines_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.ndjson");
    let output = dir.path().join("out.ndjson");
    std::fs::File::create(&input).unwrap().write_all(b"{\"a\":1}\nnot json\n{\"a\":2}\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_jn-cat"))
        .arg(&input)
        .arg("--to")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(contents, "{\"a\":1}\n{\"a\":2}\n");
}
