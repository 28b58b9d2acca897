//! Terminal presentation of repositories and pending changes

use simgit_core::PresentationSink;
use std::io::Write;

/// Prints everything it is shown to stdout
#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, text: String) {
        // Lock once so concurrent publications do not interleave
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

impl PresentationSink for TerminalSink {
    fn show_repositories(&self, names: &[String]) {
        self.print(render_list("Repositories", "No repositories added yet", names));
    }

    fn show_changes(&self, paths: &[String]) {
        self.print(render_list("Pending changes", "No pending changes", paths));
    }

    fn show_status_unavailable(&self, reason: &str) {
        self.print(format!("Status unavailable: {}\n", reason));
    }
}

fn render_list(title: &str, empty: &str, items: &[String]) -> String {
    if items.is_empty() {
        return format!("{}\n", empty);
    }

    let mut out = format!("{} ({}):\n", title, items.len());
    for item in items {
        out.push_str("  ");
        out.push_str(item);
        out.push('\n');
    }
    out
}
