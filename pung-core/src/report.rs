use chrono::{DateTime, Local};

/// Tallies for one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Comments removed outright.
    pub deleted: usize,
    /// Items overwritten with the placeholder.
    pub exploded: usize,
    /// Items that could be neither deleted nor exploded.
    pub failed: usize,
    /// Items not acted on: blacklisted boards, already-handled articles,
    /// comments whose article disappeared underneath them.
    pub skipped: usize,
    /// Reason the pass stopped early, when it did.
    pub aborted: Option<String>,
}

impl PhaseReport {
    pub fn aborted_with(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn handled(&self) -> usize {
        self.deleted + self.exploded
    }
}

/// Everything the CLI prints once a run finishes.
#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub nickname: String,
    pub planet: String,
    pub listed_comments: usize,
    pub listed_posts: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Deletion of the recent-comments listing, with explode fallback.
    pub comment_pass: PhaseReport,
    /// Explosion of owned top-level articles.
    pub article_pass: PhaseReport,
    /// Explosion of remaining owned comments found through the posts listing.
    pub sweep_pass: PhaseReport,
}

impl CleanupReport {
    pub fn total_handled(&self) -> usize {
        self.comment_pass.handled() + self.article_pass.handled() + self.sweep_pass.handled()
    }

    pub fn total_failed(&self) -> usize {
        self.comment_pass.failed + self.article_pass.failed + self.sweep_pass.failed
    }

    /// True when every pass ran to completion without failures.
    pub fn fully_clean(&self) -> bool {
        self.total_failed() == 0
            && self.comment_pass.aborted.is_none()
            && self.article_pass.aborted.is_none()
            && self.sweep_pass.aborted.is_none()
    }

    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Render a finished run as the text block the CLI prints.
pub fn generate_cleanup_report(report: &CleanupReport) -> String {
    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!(
        "  Account: {} ({})\n",
        report.nickname, report.planet
    ));
    out.push_str(&format!(
        "  Started: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "  Finished: {} ({}s)\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S"),
        report.duration_secs()
    ));
    out.push_str(&format!("  Comments listed: {}\n", report.listed_comments));
    out.push_str(&format!("  Posts listed: {}\n", report.listed_posts));
    out.push_str(&format!("  Handled: {}\n", report.total_handled()));
    out.push_str(&format!("  Failed: {}\n", report.total_failed()));
    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&phase_section("Recent comments", &report.comment_pass));
    out.push_str(&phase_section("Articles", &report.article_pass));
    out.push_str(&phase_section("Remaining comments", &report.sweep_pass));

    out
}

fn phase_section(name: &str, phase: &PhaseReport) -> String {
    let mut section = format!("## {}\n", name);
    section.push_str(&format!("  Deleted: {}\n", phase.deleted));
    section.push_str(&format!("  Exploded: {}\n", phase.exploded));
    section.push_str(&format!("  Failed: {}\n", phase.failed));
    section.push_str(&format!("  Skipped: {}\n", phase.skipped));
    if let Some(ref reason) = phase.aborted {
        section.push_str(&format!("  Aborted: {}\n", reason));
    }
    section.push('\n');
    section
}
