use std::path::PathBuf;

use clap::Parser;
use patchup::cli::{Backend, Cli, Commands, DaemonSubcommand, FmtArgs};

mod util;

#[test]
fn fmt_flag_parsing() {
    // Given
    let argv = vec![
        "pup",
        "fmt",
        "src/lib.rs",
        "--backend",
        "daemon",
        "--line-length",
        "100",
        "--fast",
        "--check",
    ];

    // When
    let cmd = Cli::parse_from(argv);

    // Then
    match cmd.command {
        Commands::Fmt(FmtArgs {
            paths,
            backend,
            line_length,
            fast,
            check,
            ..
        }) => {
            assert_eq!(paths, vec![PathBuf::from("src/lib.rs")]);
            assert_eq!(backend, Some(Backend::Daemon));
            assert_eq!(line_length, Some(100));
            assert!(fast);
            assert!(check);
        }
        _ => panic!("expected Fmt command"),
    }
}

#[test]
fn fmt_defaults_to_current_directory() {
    let cmd = Cli::parse_from(vec!["pup", "fmt"]);
    match cmd.command {
        Commands::Fmt(FmtArgs { paths, backend, .. }) => {
            assert_eq!(paths, vec![PathBuf::from(".")]);
            assert_eq!(backend, None);
        }
        _ => panic!("expected Fmt command"),
    }
}

#[test]
fn fast_and_safe_conflict() {
    let result = Cli::try_parse_from(vec!["pup", "fmt", "--fast", "--safe"]);
    assert!(result.is_err());
}

#[test]
fn daemon_subcommands_parse() {
    let cmd = Cli::parse_from(vec!["pup", "daemon", "status"]);
    match cmd.command {
        Commands::Daemon(args) => assert!(matches!(args.command, DaemonSubcommand::Status)),
        _ => panic!("expected Daemon command"),
    }
}

#[cfg(unix)]
mod end_to_end {
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    use super::util;

    #[test]
    fn fmt_rewrites_file_in_place() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let script = util::write_script(tmp.path(), "upcase.sh", util::UPPERCASE_FORMATTER);
        let file = tmp.child("notes.txt");
        file.write_str("abc\ndef\n").unwrap();

        Command::cargo_bin("pup")
            .unwrap()
            .current_dir(tmp.path())
            .args(["fmt", "notes.txt", "--no-color", "--backend", "subprocess", "--command"])
            .arg(&script)
            .assert()
            .success()
            .stdout(predicate::str::contains("reformatted notes.txt"));

        file.assert("ABC\nDEF\n");
    }

    #[test]
    fn fmt_is_idempotent() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let script = util::write_script(tmp.path(), "upcase.sh", util::UPPERCASE_FORMATTER);
        let file = tmp.child("notes.txt");
        file.write_str("ALREADY UPPER\n").unwrap();

        Command::cargo_bin("pup")
            .unwrap()
            .current_dir(tmp.path())
            .args(["fmt", "notes.txt", "--no-color", "--command"])
            .arg(&script)
            .assert()
            .success()
            .stdout(predicate::str::contains("1 unchanged"));

        file.assert("ALREADY UPPER\n");
    }

    #[test]
    fn check_mode_reports_without_writing() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let script = util::write_script(tmp.path(), "upcase.sh", util::UPPERCASE_FORMATTER);
        let file = tmp.child("notes.txt");
        file.write_str("abc\n").unwrap();

        Command::cargo_bin("pup")
            .unwrap()
            .current_dir(tmp.path())
            .args(["fmt", "notes.txt", "--no-color", "--check", "--command"])
            .arg(&script)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("would reformat notes.txt"));

        file.assert("abc\n");
    }

    #[test]
    fn failing_formatter_exits_two() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let script = util::write_script(tmp.path(), "fail.sh", util::FAILING_FORMATTER);
        let file = tmp.child("notes.txt");
        file.write_str("abc\n").unwrap();

        Command::cargo_bin("pup")
            .unwrap()
            .current_dir(tmp.path())
            .args(["fmt", "notes.txt", "--no-color", "--command"])
            .arg(&script)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("boom"));

        file.assert("abc\n");
    }

    #[test]
    fn stdin_formats_to_stdout() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let script = util::write_script(tmp.path(), "upcase.sh", util::UPPERCASE_FORMATTER);

        Command::cargo_bin("pup")
            .unwrap()
            .current_dir(tmp.path())
            .args(["fmt", "-", "--command"])
            .arg(&script)
            .write_stdin("abc\n")
            .assert()
            .success()
            .stdout("ABC\n");
    }
}
