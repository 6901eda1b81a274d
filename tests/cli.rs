use std::{
    fs,
    path::Path,
    process::{Command, Output},
};

use citemap::node::{Key, Node};

fn record(u: Node, refs: &[Node], cits: &[Node]) -> String {
    let refs: String = refs.iter().map(|&v| Key(v).to_string()).collect();
    let cits: String = cits.iter().map(|&v| Key(v).to_string()).collect();
    format!("{};1999;J;;PH;JOURNAL;1;2;3;Title {u};1;AUTHOR;0;;{refs};{cits}", Key(u))
}

/// Seeds 1 and 2 in `core.v2.gexf`, node 3 cites both
fn write_inputs(dir: &Path) {
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(
        dir.join("data").join("a.txt"),
        [
            record(1, &[], &[3]),
            record(2, &[], &[3]),
            record(3, &[1, 2], &[]),
        ]
        .join("\n"),
    )
    .unwrap();

    fs::write(
        dir.join("core.v2.gexf"),
        r#"<nodes>
  <node id="000000001" label="one">
    <viz:position x="0.0" y="0.0" z="0.0"/>
  </node>
  <node id="000000002" label="two">
    <viz:position x="40.0" y="0.0" z="0.0"/>
  </node>
</nodes>
"#,
    )
    .unwrap();
}

fn citemap(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_citemap"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn layout_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn default_outputs_drop_everything_after_the_first_dot() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = citemap(
        dir.path(),
        &[
            "layout",
            "core.v2.gexf",
            "-d",
            "data",
            "--capacity",
            "10",
            "--thresholds",
            "3,2",
        ],
    );
    assert!(output.status.success());

    let layout = dir.path().join("files").join("la-core.csv");
    assert!(!dir.path().join("files").join("la-core.v2.csv").exists());
    let rows = layout_rows(&layout);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("000000001,10000,10000"));
    assert!(rows[2].starts_with("000000003,"));

    let output = citemap(
        dir.path(),
        &[
            "render",
            "files/la-core.csv",
            "-d",
            "data",
            "--capacity",
            "10",
            "-s",
            "50",
            "--scale",
            "0.001",
            "--z-order",
            "edges-over-nodes",
        ],
    );
    assert!(output.status.success());
    let image = fs::read(dir.path().join("files").join("im-la-core.png")).unwrap();
    assert_eq!(&image[1..4], b"PNG");

    let output = citemap(
        dir.path(),
        &["annotate", "files/la-core.csv", "-d", "data", "--capacity", "10"],
    );
    assert!(output.status.success());
    let annotated = layout_rows(&dir.path().join("files").join("an-la-core.csv"));
    assert_eq!(annotated.len(), 3);
    assert!(annotated[0].ends_with(",1999,Title 1"));
}

#[test]
fn resume_into_the_same_file_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let files = dir.path().join("files");
    fs::create_dir_all(&files).unwrap();
    fs::write(
        files.join("la-core.csv"),
        "000000001,10001,10001\n000000007,5,5\n",
    )
    .unwrap();

    let output = citemap(
        dir.path(),
        &[
            "layout",
            "core.v2.gexf",
            "-d",
            "data",
            "--capacity",
            "10",
            "--resume",
            "files/la-core.csv",
        ],
    );
    assert!(output.status.success());

    // resumed rows first and verbatim, the base position of 1 is ignored
    let rows = layout_rows(&files.join("la-core.csv"));
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], "000000001,10001,10001");
    assert_eq!(rows[1], "000000007,5,5");
    assert!(rows[2].starts_with("000000002,10040,10000"));
    assert!(rows[3].starts_with("000000003,"));
}

#[test]
fn failures_exit_with_non_zero_status() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    // record directory does not exist
    let output = citemap(
        dir.path(),
        &["layout", "core.v2.gexf", "-d", "missing", "--capacity", "10"],
    );
    assert!(!output.status.success());

    // seed layout does not exist
    let output = citemap(dir.path(), &["layout", "missing.gexf", "-d", "data", "--capacity", "10"]);
    assert!(!output.status.success());

    // unknown layer order
    let output = citemap(
        dir.path(),
        &["render", "files/la-core.csv", "--z-order", "sideways"],
    );
    assert!(!output.status.success());

    // invalid configuration
    let output = citemap(
        dir.path(),
        &["layout", "core.v2.gexf", "-d", "data", "--noise=-1", "--capacity", "10"],
    );
    assert!(!output.status.success());
}
