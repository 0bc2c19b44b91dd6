use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn testdata_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

fn tagboard() -> Command {
    let mut cmd = Command::cargo_bin("tagboard").expect("binary");
    cmd.arg("--dict").arg(testdata_path("dictionaries.json"));
    cmd
}

#[test]
fn find_reports_exact_match() {
    tagboard()
        .args(["find", "--name", "TEST_4X4_A", "--bits", "1110010101001111"])
        .assert()
        .success()
        .stdout(predicate::str::diff("Match detected, ID: 1\n"));
}

#[test]
fn find_reports_no_match_for_a_flipped_bit() {
    tagboard()
        .args(["find", "--name", "TEST_4X4_A", "--bits", "0110010101001111"])
        .assert()
        .success()
        .stdout(predicate::str::diff("No match\n"));
}

#[test]
fn find_any_lists_every_dictionary() {
    tagboard()
        .args(["find", "--any", "4", "--bits", "0111100101100100"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Match detected: TEST_4X4_A ID: 2 and TEST_4X4_B ID: 1",
        ));
}

#[test]
fn find_with_rotations_reports_rotated_match() {
    tagboard()
        .args([
            "find",
            "--name",
            "TEST_5X5",
            "--bits",
            "1000111101011101011001011",
            "--rotations",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No match"))
        .stdout(predicate::str::contains("TEST_5X5 ID: 3 rotation: 1 hamming: 0"));
}

#[test]
fn find_requires_a_target() {
    tagboard()
        .args(["find", "--bits", "0101"])
        .assert()
        .failure();
}

#[test]
fn marker_snaps_size_and_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("marker.png");
    tagboard()
        .args(["marker", "--name", "TEST_5X5", "--id", "9", "--size", "100", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("TEST_5X5 id 3, 98px"));

    let img = image::open(&out).expect("decode").to_luma8();
    assert_eq!(img.dimensions(), (98, 98));
    assert_eq!(img.get_pixel(0, 0).0[0], 0);
    assert_eq!(img.get_pixel(97, 97).0[0], 0);
}

#[test]
fn render_flattens_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("scene.jpg");
    tagboard()
        .arg("render")
        .arg("--layout")
        .arg(testdata_path("layout.json"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("320x240, 2 markers, 0 skipped"));

    let bytes = std::fs::read(&out).expect("read");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let img = image::load_from_memory(&bytes).expect("decode");
    assert_eq!((img.width(), img.height()), (320, 240));
}

#[test]
fn unknown_dictionary_fails_with_message() {
    tagboard()
        .args(["find", "--name", "NOPE", "--bits", "0101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown dictionary \"NOPE\""));
}
