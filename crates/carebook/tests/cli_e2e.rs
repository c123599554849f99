#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn carebook(data_dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("carebook"));
    cmd.env("CAREBOOK_DATA_DIR", data_dir.as_os_str())
        .env_remove("RUST_LOG");
    cmd
}

fn admit(data_dir: &Path, name: &str) -> String {
    let output = carebook(data_dir)
        .args([
            "add",
            "--name",
            name,
            "--age",
            "58",
            "--address",
            "9 Quay Street\nApt 2",
            "--doctor",
            "Dr. Mensah",
            "--admission-date",
            "2026-01-15",
            "--base-bill",
            "1000",
            "--insurance",
            "10",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // "Admitted <name> as <id> (final bill ...)"
    stdout
        .split_whitespace()
        .skip_while(|w| *w != "as")
        .nth(1)
        .unwrap()
        .to_string()
}

#[test]
fn add_list_show_round_trip() {
    let temp = TempDir::new().unwrap();
    let data = temp.path();

    carebook(data)
        .args([
            "add", "--name", "Ada", "--age", "42", "--base-bill", "1000", "--insurance", "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Admitted Ada as \d{8}-001 \(final bill 900\.00\)\n$").unwrap());

    let id = admit(data, "Bo");
    assert!(id.ends_with("-002"));

    carebook(data)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada"))
        .stdout(predicate::str::contains("Bo"))
        .stdout(predicate::str::contains("admitted"));

    carebook(data)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Address:          9 Quay Street\n"))
        .stdout(predicate::str::contains("Final bill:       900.00"));

    let text = fs::read_to_string(data.join("patients.txt")).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("9 Quay Street<NL>Apt 2"));
    assert!(data.join("patients.dat").exists());
}

#[test]
fn list_json_is_machine_readable() {
    let temp = TempDir::new().unwrap();
    let id = admit(temp.path(), "Ada");

    let output = carebook(temp.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["id"], id.as_str());
    assert_eq!(parsed[0]["address"], "9 Quay Street\nApt 2");
    assert_eq!(parsed[0]["final_bill_amount"], "900.00");
}

#[test]
fn empty_store_lists_nothing() {
    let temp = TempDir::new().unwrap();
    carebook(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout("No patients found.\n");
}

#[test]
fn discharge_once_then_rejected() {
    let temp = TempDir::new().unwrap();
    let id = admit(temp.path(), "Ada");

    carebook(temp.path())
        .args(["discharge", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("final bill 900.00"));

    carebook(temp.path())
        .args(["discharge", &id])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already discharged"));

    carebook(temp.path())
        .arg("bills")
        .assert()
        .success()
        .stdout("Collected from 1 discharged patient: 900.00\n");
}

#[test]
fn unknown_id_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    admit(temp.path(), "Ada");

    for args in [
        vec!["show", "20260101-999"],
        vec!["discharge", "20260101-999"],
        vec!["update", "20260101-999", "--age", "40"],
    ] {
        carebook(temp.path())
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Patient not found: 20260101-999"));
    }
}

#[test]
fn invalid_input_is_rejected_before_storage() {
    let temp = TempDir::new().unwrap();

    carebook(temp.path())
        .args(["add", "--name", "Ada", "--age", "abc", "--base-bill", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Age must be a whole number"));

    carebook(temp.path())
        .args(["add", "--age", "30", "--base-bill", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Patient name is required"));

    assert!(!temp.path().join("patients.txt").exists());
}

#[test]
fn update_changes_only_given_fields() {
    let temp = TempDir::new().unwrap();
    let id = admit(temp.path(), "Ada");

    carebook(temp.path())
        .args(["update", &id, "--base-bill", "2000"])
        .assert()
        .success();

    carebook(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Doctor:           Dr. Mensah"))
        .stdout(predicate::str::contains("Final bill:       1800.00"));

    carebook(temp.path())
        .args([
            "update",
            &id,
            "--discharged",
            "true",
            "--discharge-date",
            "2026-01-10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("before admission date"));

    carebook(temp.path())
        .args([
            "update",
            &id,
            "--discharged",
            "true",
            "--discharge-date",
            "2026-01-20",
        ])
        .assert()
        .success();

    carebook(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("discharged 2026-01-20"));
}

#[test]
fn doctor_reports_corrupt_lines_and_keeps_them() {
    let temp = TempDir::new().unwrap();
    admit(temp.path(), "Ada");
    let primary = temp.path().join("patients.txt");
    let mut text = fs::read_to_string(&primary).unwrap();
    text.push_str("garbage without fields\n");
    fs::write(&primary, text).unwrap();

    carebook(temp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Readable records: 1"))
        .stdout(predicate::str::contains("Corrupt lines: 1"))
        .stdout(predicate::str::contains("line 2: expected 14 fields, found 1"))
        .stdout(predicate::str::contains("Backup: 1 records"));

    // Reading skips the bad line and warns on stderr.
    carebook(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada"))
        .stderr(predicate::str::contains("Skipping corrupted line"));

    admit(temp.path(), "Bo");
    assert_eq!(
        fs::read_to_string(temp.path().join("patients.txt.rejected")).unwrap(),
        "garbage without fields\n"
    );
}

#[test]
fn restore_backup_recovers_deleted_primary() {
    let temp = TempDir::new().unwrap();
    let id = admit(temp.path(), "Ada");
    fs::remove_file(temp.path().join("patients.txt")).unwrap();

    carebook(temp.path())
        .arg("restore-backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 patients"));

    carebook(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name:             Ada"));

    carebook(temp.path())
        .arg("restore-backup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));

    carebook(temp.path())
        .args(["restore-backup", "--force"])
        .assert()
        .success();
}

#[test]
fn config_file_renames_primary() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("carebook.toml"),
        "primary_file = \"ward-c.txt\"\nbackup_enabled = false\n",
    )
    .unwrap();

    admit(temp.path(), "Ada");

    assert!(temp.path().join("ward-c.txt").exists());
    assert!(!temp.path().join("patients.txt").exists());
    assert!(!temp.path().join("patients.dat").exists());

    carebook(temp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup: disabled"));
}

#[test]
fn data_dir_flag_overrides_env() {
    let temp = TempDir::new().unwrap();
    let flagged = temp.path().join("flagged");

    carebook(&temp.path().join("from-env"))
        .args(["--data-dir"])
        .arg(&flagged)
        .args(["add", "--name", "Ada", "--age", "1", "--base-bill", "0"])
        .assert()
        .success();

    assert!(flagged.join("patients.txt").exists());
    assert!(!temp.path().join("from-env").join("patients.txt").exists());
}

#[test]
fn verbose_flag_emits_debug_logs() {
    let temp = TempDir::new().unwrap();
    carebook(temp.path())
        .args(["-v", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}
