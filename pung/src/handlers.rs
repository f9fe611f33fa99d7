use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pung_client::login::{LOGIN_TIMEOUT, browser_login};
use tracing_subscriber;

// Re-export cleanup types and functions from pung-core
pub use pung_core::{
    CleanupOptions, CleanupProgressCallback, CleanupReport, execute_cleanup,
    generate_cleanup_report,
};

// Helper functions for the clean handler

/// Color a progress line, highlighting failure lines.
pub fn format_progress_line(line: &str) -> String {
    if line.starts_with("[!]") {
        line.yellow().to_string()
    } else {
        line.to_string()
    }
}

/// One-line verdict printed after the report.
pub fn verdict_line(report: &CleanupReport) -> String {
    if report.fully_clean() {
        format!(
            "{} Nothing left to clean up on this account",
            "✓".green().bold()
        )
    } else if report.total_failed() > 0 {
        format!(
            "{} {} item(s) could not be handled, details in the report above",
            "⚠".yellow().bold(),
            report.total_failed()
        )
    } else {
        format!(
            "{} Some passes were cut short, details in the report above",
            "⚠".yellow().bold()
        )
    }
}

fn login_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run the whole cleanup: interactive login, then the three passes.
pub async fn handle_clean(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let quiet = sub_matches.get_flag("quiet");
    let options = CleanupOptions::default();

    if !quiet {
        let skipped_boards = options
            .blacklist
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        println!("\n🧹 Cleaning up an account on {}", options.base_url);
        println!("Boards left untouched: {}", skipped_boards);
        println!("Passes: recent comments, owned articles, remaining comments\n");
    }

    // The login happens in a visible browser window; spin until the
    // human has signed in there.
    let spinner = login_spinner();
    spinner.set_message("Waiting for the login to finish in the browser window...");
    let login_result = browser_login(&options.base_url, LOGIN_TIMEOUT).await;
    spinner.finish_and_clear();
    let session = login_result.context("login did not complete")?;

    // Execute cleanup with progress callback
    let progress_callback: CleanupProgressCallback = Arc::new(|msg: String| {
        println!("{}", format_progress_line(&msg));
    });

    let report = execute_cleanup(options, session, Some(progress_callback)).await?;

    println!("\n✓ Cleanup complete!\n");

    // Generate and display report
    let report_text = generate_cleanup_report(&report);
    print!("{}", report_text);

    println!("{}", verdict_line(&report));

    Ok(())
}
