use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("diary").expect("Failed to find diary binary");

        // No config.toml is picked up from the temp dir
        cmd.current_dir(self.temp_dir.path());
        cmd.env("DIARY_DATABASE_PATH", &self.db_path);
        cmd.env_remove("RUST_LOG");

        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs `list ... --json` and parses the output
    pub fn list_json(&self, args: &[&str]) -> Vec<Value> {
        let mut full = vec!["list"];
        full.extend_from_slice(args);
        full.push("--json");
        let output = self.run_success(&full).get_output().stdout.clone();
        serde_json::from_slice::<Vec<Value>>(&output).expect("list --json did not print a JSON array")
    }

    /// ID of the first schedule occurring on `day`
    pub fn id_on(&self, day: &str) -> String {
        let occurrences = self.list_json(&["--day", day]);
        occurrences
            .first()
            .and_then(|o| o["id"].as_str())
            .map(str::to_string)
            .expect("no schedule on that day")
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Weekly standup through March 2024
    pub fn standup_args() -> Vec<&'static str> {
        vec![
            "add", "Standup",
            "--start", "2024-03-01 09:00",
            "--end", "09:15",
            "--location", "A",
            "--repeat", "weekly",
            "--until", "2024-03-29",
        ]
    }

    pub fn dentist_args() -> Vec<&'static str> {
        vec!["add", "Dentist", "--start", "2024-03-05 14:00", "--color", "red"]
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    pub fn schedule_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Created"))
    }

    pub fn has_occurrence_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Date")
            .and(predicate::str::contains("Time"))
            .and(predicate::str::contains("Title"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
