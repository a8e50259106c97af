//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! test fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Submits every operation through the per-wallet lanes
//! 3. Generates the balance CSV
//! 4. Compares actual output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path scenarios
//! - Rejected withdrawals and withdrawals from unknown wallets
//! - Interleaved wallets
//! - Scale and ceiling handling
//! - Malformed rows
//!
//! Each fixture is replayed with a single worker thread and with several, and
//! with a tiny batch size as well as the default.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;
    use wallet_engine::replay::{ReplayConfig, ReplayRunner, ReplaySummary};
    use wallet_engine::EngineConfig;

    /// Run a test fixture by replaying input.csv and comparing with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if the fixture files cannot be read, the replay fails, or the
    /// output doesn't match expected.csv byte for byte.
    fn run_test_fixture(fixture_name: &str, worker_threads: usize, batch_size: usize) -> ReplaySummary {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let runner = ReplayRunner::new(ReplayConfig::new(
            EngineConfig::default(),
            batch_size,
            worker_threads,
        ));

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        let summary = runner
            .run(Path::new(&input_path), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay operations: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (threads: {}, batch: {})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, worker_threads, batch_size, actual_output, expected_output
        );
        summary
    }

    #[rstest]
    #[case("happy_path")]
    #[case("insufficient_funds")]
    #[case("multiple_wallets")]
    #[case("precision_testing")]
    #[case("malformed_data")]
    #[case("empty_input")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(1, 4)] worker_threads: usize,
        #[values(2, 1000)] batch_size: usize,
    ) {
        run_test_fixture(fixture, worker_threads, batch_size);
    }

    #[rstest]
    #[case::happy_path("happy_path", 3, 0, 0)]
    #[case::insufficient_funds("insufficient_funds", 2, 3, 0)]
    #[case::multiple_wallets("multiple_wallets", 8, 1, 0)]
    #[case::precision_testing("precision_testing", 5, 1, 2)]
    #[case::malformed_data("malformed_data", 4, 0, 6)]
    #[case::empty_input("empty_input", 0, 0, 0)]
    fn test_fixture_summaries(
        #[case] fixture: &str,
        #[case] committed: usize,
        #[case] failed: usize,
        #[case] rejected: usize,
    ) {
        let summary = run_test_fixture(fixture, 2, 1000);

        assert_eq!(summary.committed, committed, "committed count for {}", fixture);
        assert_eq!(summary.failed, failed, "failed count for {}", fixture);
        assert_eq!(summary.rejected, rejected, "rejected count for {}", fixture);
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let runner = ReplayRunner::new(ReplayConfig::default());
        let mut output = Vec::new();

        let err = runner
            .run(Path::new("tests/fixtures/does_not_exist.csv"), &mut output)
            .unwrap_err();

        assert!(err.contains("Failed to open file"));
        assert!(output.is_empty());
    }
}
