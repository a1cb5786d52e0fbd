//! End-to-end smoke test over the compiled `jn-merge` binary: declared
//! source order is preserved, and tagged records carry their source
//! label.

use std::io::Write;
use std::process::Command;

#[test]
fn concatenates_sources_in_declared_order_with_tags() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.ndjson");
    let b = dir.path().join("b.ndjson");
    let output = dir.path().join("out.ndjson");

    std::fs::File::create(&a).unwrap().write_all(b"{\"v\":1}\n{\"v\":2}\n").unwrap();
    std::fs::File::create(&b).unwrap().write_all(b"{\"v\":3}\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_jn-merge"))
        .arg(&a)
        .arg(&b)
        .arg("--to")
        .arg(&output)
        .arg("--tag-field")
        .arg("source")
        .arg("--label")
        .arg("a")
        .arg("--label")
        .arg("b")
        .status()
        .unwrap();
    assert!(status.success());

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<serde_json::Value> = contents.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], serde_json::json!({"v": 1, "source": "a"}));
    assert_eq!(lines[1], serde_json::json!({"v": 2, "source": "a"}));
    assert_eq!(lines[2], serde_json::json!({"v": 3, "source": "b"}));
}
