use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("telempack"))
}

fn write_stream(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create fixture");
    file.write_all(bytes).expect("write fixture");
    path
}

fn fixed_packet(id: &str, payload: &str) -> Vec<u8> {
    let mut out = format!("[{id}]{:06}", payload.len()).into_bytes();
    out.extend_from_slice(payload.as_bytes());
    out
}

fn legacy_stream() -> Vec<u8> {
    let mut bytes = fixed_packet("00", "<stream version=\"2.2\"></stream>");
    bytes.extend(fixed_packet(
        "01",
        "<packet><x type=\"time24\" units=\"us2000\"></x><y type=\"sun_real4\"></y></packet>",
    ));
    bytes.extend(b":01:");
    bytes.extend([0u8; 28]);
    bytes
}

#[test]
fn help_lists_both_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("sniff").and(contains("verify")));
}

#[test]
fn sniff_missing_input_shows_error() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.d2s");

    cmd()
        .arg("sniff")
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn sniff_outputs_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_stream(&temp, "stream.d2s", &legacy_stream());

    let assert = cmd().arg("sniff").arg(input).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["content"], "stream");
    assert_eq!(value["version"], "2.2");
    assert_eq!(value["tag_style"], "fixed");
    assert_eq!(value["namespaces"], false);
}

#[test]
fn sniff_rejects_tiny_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_stream(&temp, "tiny.d2s", b"[00]");

    cmd()
        .arg("sniff")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn verify_accepts_a_clean_stream() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_stream(&temp, "stream.d2s", &legacy_stream());

    cmd()
        .arg("verify")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("no structural defects found").and(contains("|Hx|1| ")));
}

#[test]
fn verify_quiet_omits_the_listing() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_stream(&temp, "stream.d2s", &legacy_stream());

    cmd()
        .arg("verify")
        .arg(&input)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(contains("packets read").not())
        .stdout(contains("no structural defects found"));
}

#[test]
fn verify_header_echoes_payloads() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_stream(&temp, "stream.d2s", &legacy_stream());

    cmd()
        .arg("verify")
        .arg(&input)
        .arg("--header")
        .assert()
        .success()
        .stdout(contains("<stream version=\"2.2\">"));
}

#[test]
fn verify_flags_data_without_a_header() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = fixed_packet("00", "<stream version=\"2.2\"></stream>");
    bytes.extend(b":05:");
    bytes.extend([0u8; 8]);
    let input = write_stream(&temp, "orphan.d2s", &bytes);

    cmd()
        .arg("verify")
        .arg(input)
        .assert()
        .failure()
        .stderr(
            contains("error:")
                .and(contains("05"))
                .and(contains("hint:")),
        );
}

#[test]
fn verify_flags_an_unsizable_legacy_header() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = fixed_packet("00", "<stream version=\"2.2\"></stream>");
    bytes.extend(fixed_packet("01", "<packet>\n<y units=\"V\"></y>\n</packet>"));
    let input = write_stream(&temp, "unsizable.d2s", &bytes);

    // Strict sizing runs on the header itself, so the defect is reported
    // with line context before any data packet is needed.
    cmd()
        .arg("verify")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("in header for packet id 1").and(contains("--->")));
}

#[test]
fn verify_flags_a_malformed_property() {
    let temp = TempDir::new().expect("tempdir");
    let bytes = fixed_packet(
        "00",
        "<stream version=\"2.2\"><properties a:b:c=\"nope\"/></stream>",
    );
    let input = write_stream(&temp, "badprop.d2s", &bytes);

    cmd()
        .arg("verify")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn verify_reads_the_variable_dialect() {
    let temp = TempDir::new().expect("tempdir");
    let header = "<stream version=\"3.0\"></stream>";
    let dataset = "<dataset><data><scalar><packet numItems=\"2\" itemBytes=\"4\"/></scalar></data></dataset>";
    let mut bytes = format!("|Sx|0|{}|{header}", header.len()).into_bytes();
    bytes.extend(format!("|Hx|1|{}|{dataset}", dataset.len()).into_bytes());
    bytes.extend(b"|Pd|1|8|");
    bytes.extend([0u8; 8]);
    let input = write_stream(&temp, "stream.d3b", &bytes);

    cmd()
        .arg("verify")
        .arg(input)
        .assert()
        .success()
        .stdout(contains("version 3.0").and(contains("no structural defects found")));
}
