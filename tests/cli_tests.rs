use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn users_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
  {{"id": "100", "handle": "alice", "email": "alice@example.com",
    "accountToken": "acct-alice", "accessToken": "tok-100"}},
  {{"id": "200", "handle": "bob", "phone": "555-0102",
    "accountToken": "acct-bob", "accessToken": "tok-200"}}
]"#
    )
    .unwrap();
    file
}

#[test]
fn test_drains_backlog_and_pays() {
    let users = users_file();
    let mut jobs = NamedTempFile::new().unwrap();
    writeln!(
        jobs,
        r#"{{"text": "thanks @alice @bob $15 for lunch", "user": {{"id": "100"}}}}"#
    )
    .unwrap();
    writeln!(jobs, r#"{{"text": "$5 @bob", "user": {{"id": "200"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("tipjar"));
    cmd.arg(jobs.path()).arg("--users").arg(users.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("paid 15 to alice@example.com"))
        .stdout(predicate::str::contains("paid 15 to 555-0102"))
        .stdout(predicate::str::contains("paid 5 to 555-0102"))
        .stdout(predicate::str::contains(
            "drained: 2 jobs seeded, 0 resubmissions, 0 dead-lettered",
        ));
}

#[test]
fn test_over_ceiling_job_pays_nobody() {
    let users = users_file();
    let mut jobs = NamedTempFile::new().unwrap();
    writeln!(jobs, r#"{{"text": "$25 @alice", "user": {{"id": "100"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("tipjar"));
    cmd.arg(jobs.path()).arg("--users").arg(users.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("paid").not())
        .stdout(predicate::str::contains(
            "drained: 1 jobs seeded, 0 resubmissions, 0 dead-lettered",
        ));
}

#[test]
fn test_poison_jobs_are_dead_lettered() {
    let users = users_file();
    let mut jobs = NamedTempFile::new().unwrap();
    // No amount in the text.
    writeln!(
        jobs,
        r#"{{"text": "no dollar sign here @alice", "user": {{"id": "100"}}}}"#
    )
    .unwrap();
    // Unknown user, so no access token.
    writeln!(jobs, r#"{{"text": "$5 @alice", "user": {{"id": "999"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("tipjar"));
    cmd.arg(jobs.path()).arg("--users").arg(users.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "dead-letter: no dollar sign here @alice (no payment amount found in text)",
        ))
        .stderr(predicate::str::contains("no access token for user 999"))
        .stdout(predicate::str::contains("2 dead-lettered"));
}

#[test]
fn test_malformed_job_line_is_reported_and_skipped() {
    let users = users_file();
    let mut jobs = NamedTempFile::new().unwrap();
    writeln!(jobs, "not json at all").unwrap();
    writeln!(jobs, r#"{{"text": "$5 @alice", "user": {{"id": "100"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("tipjar"));
    cmd.arg(jobs.path()).arg("--users").arg(users.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading job"))
        .stdout(predicate::str::contains("paid 5 to alice@example.com"))
        .stdout(predicate::str::contains("1 jobs seeded"));
}
