//! CLI argument parsing tests for the qstats command.
//!
//! These tests stop before any netlink traffic, so they need neither
//! network access nor root privileges.

use assert_cmd::Command;
use predicates::prelude::*;

fn qstats_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_qstats"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        qstats_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Queueing discipline statistics"));
    }

    #[test]
    fn test_version() {
        qstats_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("qstats"));
    }

    #[test]
    fn test_help_lists_options() {
        qstats_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--timeout <MS>"))
            .stdout(predicate::str::contains("--buffer-floor <BYTES>"))
            .stdout(predicate::str::contains("--strict"))
            .stdout(predicate::str::contains("[DEV]"));
    }

    #[test]
    fn test_short_flags() {
        qstats_cmd().args(["-j", "-p", "-s", "-d", "-n", "--help"]).assert().success();
    }

    #[test]
    fn test_long_flags() {
        qstats_cmd()
            .args(["--json", "--pretty", "--stats", "--details", "--numeric", "--help"])
            .assert()
            .success();
    }

    #[test]
    fn test_unknown_flag() {
        qstats_cmd()
            .arg("--bogus")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

mod values {
    use super::*;

    #[test]
    fn test_timeout_requires_number() {
        qstats_cmd()
            .args(["--timeout", "soon"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_buffer_floor_requires_number() {
        qstats_cmd()
            .args(["--buffer-floor", "-5"])
            .assert()
            .failure();
    }

    #[test]
    fn test_too_many_devices() {
        qstats_cmd()
            .args(["eth0", "eth1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unexpected argument"));
    }
}

mod devices {
    use super::*;

    #[test]
    fn test_unknown_device() {
        qstats_cmd()
            .arg("nosuchdev0")
            .assert()
            .failure()
            .stderr(predicate::str::contains("interface not found: nosuchdev0"));
    }

    #[test]
    fn test_invalid_device_name() {
        qstats_cmd()
            .arg("bad/name")
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid"));
    }

    #[test]
    fn test_error_reports_kind() {
        qstats_cmd()
            .arg("nosuchdev0")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::starts_with("Error: transport error"));
    }
}
