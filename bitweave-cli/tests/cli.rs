use assert_cmd::prelude::*; // Add methods on commands
use assert_fs::{prelude::*, TempDir};
use predicates::prelude::*;
use std::process::Command; // Run programs
use test_log::test;

const BIN: &str = "bwv";

/// Write a CSV file with columns `id`, `a` and `b` to a fresh directory.
fn sample_input() -> Result<TempDir, Box<dyn std::error::Error>> {
    let directory = TempDir::new()?;
    let mut content = String::from("id,a,b\n");
    for row in 0..200u64 {
        content.push_str(&format!("{row},{},{}\n", row % 64, (row * 7) % 64));
    }
    directory.child("input.csv").write_str(&content)?;

    Ok(directory)
}

#[cfg_attr(miri, ignore)]
#[test]
fn cli_argument_parsing() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("-h");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Print help"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(BIN));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("input.csv");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--index"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.args(["input.csv", "--index", "a"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing bit width"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.args(["input.csv", "--index", "a:6", "--where", "a => 3"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("COLUMN OP CONSTANT"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.args(["input.csv", "--index", "a:6", "-v", "-q"]);
    cmd.assert().failure().stderr(predicate::str::contains(
        "argument '--verbose...' cannot be used with '--quiet'",
    ));

    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn cli_select_rows() -> Result<(), Box<dyn std::error::Error>> {
    let directory = sample_input()?;
    let input = directory.child("input.csv");

    // a = row % 64, so 9 < a < 20 holds for 10 values in each of 3 full and 1 partial period
    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path())
        .args(["--index", "a:6:h", "--index", "b:6:v"])
        .args(["--where", "a > 9", "--where", "a < 20"])
        .args(["--report", "none"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Selected").and(predicate::str::contains("of 200 rows")));

    let expected = (0..200u64)
        .filter(|row| {
            let (a, b) = (row % 64, (row * 7) % 64);
            9 < a && a < 20 && b < 10
        })
        .count();

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path())
        .args(["--index", "a:6:h", "--index", "b:6:v"])
        .args(["--where", "a > 9", "--where", "a < 20", "--where", "b < 10"])
        .args(["--print-rows"]);
    let output = cmd.output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains(&format!("Selected {expected} of 200 rows.")));
    assert!(stdout.contains("row\ta\tb"));
    // Header line, count line and one line per selected row
    assert_eq!(stdout.lines().count(), expected + 2);

    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn cli_query_file_and_store() -> Result<(), Box<dyn std::error::Error>> {
    let directory = sample_input()?;
    let input = directory.child("input.csv");
    let store = directory.child("store");
    let query = directory.child("query.json");
    query.write_str(
        r#"[{ "column": "id", "units": [
            { "predicate": { "compare": { "comparator": "less", "constant": 50 } } },
            { "predicate": { "compare": { "comparator": "greater_equal", "constant": 20 } }, "combine_op": "and" }
        ] }]"#,
    )?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path())
        .args(["--index", "id:8"])
        .arg("--query")
        .arg(query.path())
        .arg("--store")
        .arg(store.path())
        .args(["--report", "all"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Selected 30 of 200 rows."))
        .stdout(predicate::str::contains("Scanning"))
        .stdout(predicate::str::contains("Memory:"));

    store.child("id.bwc").assert(predicate::path::exists());

    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn cli_errors() -> Result<(), Box<dyn std::error::Error>> {
    let directory = sample_input()?;
    let input = directory.child("input.csv");

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path()).args(["--index", "a:6"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no predicate was given"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path())
        .args(["--index", "missing:6", "--where", "missing = 1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input file has no column \"missing\""));

    // id runs up to 199, which does not fit into 4 bits
    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path()).args(["--index", "id:4", "--where", "id = 1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not fit into 4 bits"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(input.path()).args(["--index", "a:6", "--where", "b = 1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Column \"b\" does not exist"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(directory.child("absent.csv").path())
        .args(["--index", "a:6", "--where", "a = 1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));

    Ok(())
}
