//! Publish progress and results on stderr.

use console::{Style, Term};

/// Width of the rule printed between previewed pages.
const RULE_WIDTH: usize = 70;

/// Writes per-page publish results.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    failed: Style,
    title: Style,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            failed: Style::new().red(),
            title: Style::new().cyan().bold(),
        }
    }

    /// Plain progress line.
    pub(crate) fn status(&self, msg: &str) {
        self.line(msg);
    }

    /// Page title or mode banner.
    pub(crate) fn heading(&self, msg: &str) {
        self.line(&self.title.apply_to(msg).to_string());
    }

    /// Rule between previewed pages.
    pub(crate) fn rule(&self) {
        self.line(&"-".repeat(RULE_WIDTH));
    }

    pub(crate) fn published(&self, page_title: &str, url: &str) {
        self.line(&self.ok.apply_to(format!("  -> {page_title} ({url})")).to_string());
    }

    pub(crate) fn page_failed(&self, page_title: &str, reason: &str) {
        self.line(&self.failed.apply_to(format!("  x {page_title}: {reason}")).to_string());
    }

    /// Detail below a published page.
    pub(crate) fn detail(&self, msg: &str) {
        self.line(&format!("     {msg}"));
    }

    /// Non-fatal problem below a published page (label, attachment).
    pub(crate) fn problem(&self, msg: &str) {
        self.line(&self.warn.apply_to(format!("     {msg}")).to_string());
    }

    /// Run-ending error.
    pub(crate) fn fatal(&self, reason: &str) {
        self.line(&self.failed.apply_to(format!("Error: {reason}")).to_string());
    }

    /// Final tally, green when nothing failed.
    pub(crate) fn summary(&self, verb: &str, total: usize, failed: usize) {
        let line = summary_line(verb, total, failed);
        let style = if failed == 0 { &self.ok } else { &self.failed };
        self.line(&style.apply_to(line).to_string());
    }

    fn line(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }
}

fn summary_line(verb: &str, total: usize, failed: usize) -> String {
    if failed == 0 {
        format!("\n{total} page(s) {verb}.")
    } else {
        format!("\n{} page(s) {verb}, {failed} failed.", total - failed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line("published", 3, 0), "\n3 page(s) published.");
        assert_eq!(
            summary_line("published", 3, 1),
            "\n2 page(s) published, 1 failed."
        );
        assert_eq!(summary_line("rendered", 0, 0), "\n0 page(s) rendered.");
    }
}
