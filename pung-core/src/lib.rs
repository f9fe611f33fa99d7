use colored::Colorize;

pub mod cleanup;
pub mod group;
pub mod report;

pub use cleanup::{
    CleanupOptions, CleanupProgressCallback, DEFAULT_BASE_URL, DEFAULT_BLACKLIST, RetryPolicy,
    execute_cleanup,
};
pub use group::{BoardGroups, group_by_board};
pub use report::{CleanupReport, PhaseReport, generate_cleanup_report};

/// Print the startup banner
pub fn print_banner() {
    let banner = r#"
██████╗ ██╗   ██╗███╗   ██╗ ██████╗
██╔══██╗██║   ██║████╗  ██║██╔════╝
██████╔╝██║   ██║██╔██╗ ██║██║  ███╗
██╔═══╝ ██║   ██║██║╚██╗██║██║   ██║
██║     ╚██████╔╝██║ ╚████║╚██████╔╝
╚═╝      ╚═════╝ ╚═╝  ╚═══╝ ╚═════╝
"#;
    println!("{}", banner.cyan());
    println!(
        "  {} v{}\n",
        "Quasar Zone account cleanup".bold(),
        env!("CARGO_PKG_VERSION")
    );
}
