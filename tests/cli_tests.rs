//! Exit codes and stream usage of the `addrgrs` binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::*;

fn addrgrs() -> Command {
    Command::cargo_bin("addrgrs").unwrap()
}

#[test]
fn test_help_exits_zero() {
    addrgrs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--read-group"))
        .stdout(predicate::str::contains("--uncompressed"));
}

#[test]
fn test_no_inputs_exits_one_with_empty_stdout() {
    addrgrs()
        .args(["-s", "S1"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no input files specified"));
}

#[test]
fn test_no_arguments_exits_one() {
    addrgrs()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unknown_option_exits_one() {
    addrgrs()
        .args(["-b", "a.bam", "--frobnicate"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_input_exits_one() {
    addrgrs()
        .args(["-b", "/nonexistent/missing.bam"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("could not open input BAM file"));
}

#[test]
fn test_region_without_index_exits_one() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.bam");
    write_bam(&a, &header("coordinate"), &[mapped("a1", 0, 10)]);
    let a = path_str(&a);

    addrgrs()
        .args(["-b", &a, "-R", "chr1:10..20"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("could not load index"));
}

#[test]
fn test_verbose_logs_merge_order_once() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.bam");
    write_bam(&a, &header("coordinate"), &[mapped("a1", 0, 10)]);
    let a = path_str(&a);

    let output = addrgrs().args(["-v", "-b", &a]).env_remove("RUST_LOG").output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("merging 1 inputs").count(), 1);
}

#[test]
fn test_merge_writes_bam_to_stdout() {
    let dir = TempDir::new().unwrap();
    let header = header("coordinate");
    let a = dir.path().join("a.bam");
    let b = dir.path().join("b.bam");
    write_bam(&a, &header, &[mapped("a1", 0, 10)]);
    write_bam(&b, &header, &[mapped("b1", 0, 20)]);
    let (a, b) = (path_str(&a), path_str(&b));

    let output = addrgrs()
        .args(["-b", &a, "-s", "S1", "-b", &b, "-r", "RG2", "-s", "S2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(&output.stdout[..2], &[0x1f, 0x8b]);

    let (header, records) = read_output(output.stdout);
    assert_eq!(header_read_groups(&header), vec!["S1".to_string(), "RG2".to_string()]);
    let tags: Vec<_> = records.iter().map(read_group).collect();
    assert_eq!(tags, vec![Some("S1".to_string()), Some("RG2".to_string())]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("S1"));
    assert!(stderr.contains("wrote 2 records"));
}
