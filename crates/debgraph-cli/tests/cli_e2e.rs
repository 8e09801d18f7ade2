use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn debgraph_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_debgraph"))
}

fn write_sources(dir: &Path) {
    fs::write(
        dir.join("groups.json"),
        r#"[{"gid": ["Debian"], "gidNumber": [800]}]"#,
    )
    .unwrap();
    fs::write(
        dir.join("developers.json"),
        r#"[{"uid": ["jdoe"], "uidNumber": [2001], "cn": ["Jane"],
             "supplementaryGid": ["Debian"], "keyFingerPrint": ["F1"]}]"#,
    )
    .unwrap();
    fs::write(
        dir.join("servers.json"),
        r#"[{"hostname": ["ries"], "sshRSAHostKey": ["ssh-rsa AAAA ries"]}]"#,
    )
    .unwrap();
}

fn read_array(path: &Path) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn ingest_then_transform_writes_every_collection() {
    let work = tempfile::tempdir().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir_all(&input).unwrap();
    write_sources(&input);

    fs::write(
        work.path().join("dm.txt"),
        "Fingerprint: F9\nUid: Maint\nAllow: bar (F1)\n",
    )
    .unwrap();
    fs::write(
        work.path().join("available"),
        "Package: bar\nSource: foo (1.0-1)\nVersion: 1.0-1\n",
    )
    .unwrap();

    let status = Command::new(debgraph_bin())
        .args(["ingest", "dm"])
        .arg(work.path().join("dm.txt"))
        .arg("--out")
        .arg(input.join("dm.json"))
        .status()
        .unwrap();
    assert!(status.success());

    let status = Command::new(debgraph_bin())
        .args(["ingest", "packages"])
        .arg(work.path().join("available"))
        .arg("--out")
        .arg(input.join("packages.json"))
        .status()
        .unwrap();
    assert!(status.success());

    let status = Command::new(debgraph_bin())
        .arg("transform")
        .arg(&input)
        .arg(&output)
        .args(["--flavor", "arango"])
        .status()
        .unwrap();
    assert!(status.success());

    for collection in [
        "groups",
        "developers",
        "gpg_keys",
        "servers",
        "ssh_keys",
        "packages",
        "relations",
    ] {
        assert!(
            output.join(format!("{collection}.json")).exists(),
            "{collection}.json missing"
        );
    }

    let packages = read_array(&output.join("packages.json"));
    assert_eq!(packages.len(), 2);
    assert!(packages.iter().all(|p| p.get("_key").is_some()));

    let relations = read_array(&output.join("relations.json"));
    assert!(relations.iter().any(|r| {
        r["_from"] == "packages/bar" && r["_to"] == "packages/foo" && r["version"] == "1.0-1"
    }));
    assert!(relations
        .iter()
        .any(|r| r["_from"] == "gpg_keys/F9" && r["kind"] == "Has DM permission"));
}

#[test]
fn missing_source_fails_without_relations() {
    let work = tempfile::tempdir().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir_all(&input).unwrap();
    write_sources(&input);

    let result = Command::new(debgraph_bin())
        .arg("transform")
        .arg(&input)
        .arg(&output)
        .output()
        .unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("packages"), "stderr: {stderr}");
    assert!(output.join("servers.json").exists());
    assert!(!output.join("relations.json").exists());
}
