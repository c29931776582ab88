//! Testgen command - generate tests for a diff via the review backend.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::auth::AuthSession;
use crate::config::Settings;
use crate::testgen::{TestGenClient, write_test_file};

/// Arguments for the testgen command.
pub struct TestgenArgs {
    pub diff: Option<PathBuf>,
    pub project_root: PathBuf,
    pub skip_validate: bool,
}

/// Run the testgen command.
///
/// Generates tests for the diff, validates them against the backend, and
/// only writes the file once validation passes (or is skipped).
pub async fn run(args: TestgenArgs, config: Settings) {
    let diff = read_diff(args.diff.as_deref());
    if diff.trim().is_empty() {
        eprintln!("No diff provided. Commit first, or pass one with --diff.");
        std::process::exit(1);
    }

    let auth = match config.auth.token.as_deref() {
        Some(token) => AuthSession::with_token(token),
        None => AuthSession::new(),
    };

    let client = match TestGenClient::new(&config.review) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Cannot create test generation client: {e}");
            std::process::exit(1);
        }
    };

    println!("Generating test case from diff...");
    let tests = match client.generate(&diff, &auth).await {
        Ok(tests) => tests,
        Err(e) => {
            eprintln!("Test generation failed: {e}");
            std::process::exit(1);
        }
    };

    if !args.skip_validate {
        match client.validate(&tests, &auth).await {
            Ok(report) if report.passed => {
                println!("Validation passed: {}", report.verdict);
            }
            Ok(report) => {
                eprintln!("Validation failed: {}", report.verdict);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Validation request failed: {e}");
                std::process::exit(1);
            }
        }
    }

    match write_test_file(&args.project_root, &config.testgen, &tests) {
        Ok(path) => println!("Test case saved: {}", path.display()),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn read_diff(path: Option<&Path>) -> String {
    match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Cannot read diff from {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("Cannot read diff from stdin: {e}");
                std::process::exit(1);
            }
            text
        }
    }
}
