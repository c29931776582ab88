//! Watch command - the commit watch and review relay daemon.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::{AuthClient, AuthSession};
use crate::config::Settings;
use crate::console::{ConsoleLog, ReviewLog};
use crate::dispatch::{Dispatcher, HttpReviewClient};
use crate::store::LastDiffStore;
use crate::watcher::WatchSessionManager;
use crate::workspace::{SelectionFeed, WorkspaceScanner};

/// Arguments for the watch command.
pub struct WatchArgs {
    pub workspace: Option<PathBuf>,
    pub project: Option<String>,
    pub login: bool,
}

/// Run the watch command until Ctrl-C.
pub async fn run(args: WatchArgs, config: Settings) {
    let auth = Arc::new(match config.auth.token.as_deref() {
        Some(token) => AuthSession::with_token(token),
        None => AuthSession::new(),
    });

    if args.login {
        login(&auth, &config).await;
    }

    let log = Arc::new(ConsoleLog::new());

    let sink = match HttpReviewClient::new(&config.review) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            eprintln!("Cannot create review client: {e}");
            std::process::exit(1);
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        auth.clone(),
        sink,
        log.clone(),
        Arc::new(LastDiffStore::new()),
    ));

    let workspace_root = args
        .workspace
        .or_else(|| config.workspace_root.clone())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    log.record("diffwatch started.");
    if !auth.is_authorized() {
        log.record("Please log in to enable AI code review.");
    }

    let feed = SelectionFeed::new();
    seed_selection(&feed, &workspace_root, args.project.as_deref(), log.as_ref());
    log.record("Waiting for commits...");

    let manager = WatchSessionManager::new(config.watch.settle_ms, dispatcher, log.clone());
    let shutdown = CancellationToken::new();
    let worker = tokio::spawn(manager.run(
        feed.subscribe(),
        config.watch.resolve_on_start,
        shutdown.clone(),
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Cannot listen for shutdown signal: {e}");
    }

    log.record("Stopping diffwatch...");
    shutdown.cancel();
    let _ = worker.await;
}

/// Publish the initial selection from the workspace directory.
///
/// With `--project` the named project must exist; without it the first
/// project by name order is used, matching a fresh workspace open.
fn seed_selection(
    feed: &SelectionFeed,
    workspace_root: &Path,
    project: Option<&str>,
    log: &dyn ReviewLog,
) {
    let scanner = WorkspaceScanner::new(workspace_root);

    let selection = match project {
        Some(name) => match scanner.find(name) {
            Ok(Some(project)) => Some(project),
            Ok(None) => {
                eprintln!(
                    "No project named '{name}' under {}",
                    workspace_root.display()
                );
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Cannot scan workspace {}: {e}", workspace_root.display());
                std::process::exit(1);
            }
        },
        None => match scanner.first() {
            Ok(first) => first,
            Err(e) => {
                eprintln!("Cannot scan workspace {}: {e}", workspace_root.display());
                std::process::exit(1);
            }
        },
    };

    match &selection {
        Some(project) => log.record(&format!("Using project: {}", project.name)),
        None => log.record("No projects found in workspace."),
    }

    feed.select(selection);
}

/// Prompt for credentials and install the resulting token.
///
/// The password prompt never echoes; neither credential is written
/// anywhere.
async fn login(auth: &AuthSession, config: &Settings) {
    let term = console::Term::stderr();

    let email = match &config.auth.email {
        Some(email) => {
            let _ = term.write_line(&format!("Logging in as {email}"));
            email.clone()
        }
        None => {
            let _ = term.write_str("Email: ");
            match term.read_line() {
                Ok(line) => line.trim().to_string(),
                Err(e) => {
                    eprintln!("Cannot read email: {e}");
                    std::process::exit(1);
                }
            }
        }
    };

    let _ = term.write_str("Password: ");
    let password = match term.read_secure_line() {
        Ok(line) => line,
        Err(e) => {
            eprintln!("Cannot read password: {e}");
            std::process::exit(1);
        }
    };

    let client = match AuthClient::new(&config.review) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Cannot create login client: {e}");
            std::process::exit(1);
        }
    };

    match client.login(&email, &password).await {
        Ok(token) => {
            auth.set_token(token);
            let _ = term.write_line("Login successful.");
        }
        Err(e) => {
            eprintln!("Login failed: {e}");
            std::process::exit(1);
        }
    }
}
