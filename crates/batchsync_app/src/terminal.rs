use std::io::{self, Write};

use batchsync_core::{HistoryRow, JobRowView, ListView, Notice, Severity, SyncViewModel};
use batchsync_engine::{DesktopPermission, Notifier};

/// Prints notices to the terminal. "Desktop" notifications ring the bell.
pub struct TerminalNotifier {
    desktop: DesktopPermission,
}

impl TerminalNotifier {
    pub fn new(desktop_granted: bool) -> Self {
        let desktop = if desktop_granted {
            DesktopPermission::Granted
        } else {
            DesktopPermission::NotAsked
        };
        Self { desktop }
    }
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "ok",
        Severity::Error => "!!",
        Severity::Info => "--",
        Severity::Warning => "!",
    }
}

impl Notifier for TerminalNotifier {
    fn toast(&self, notice: &Notice) {
        println!("[{}] {}", marker(notice.severity), notice.message);
    }

    fn desktop_permission(&self) -> DesktopPermission {
        self.desktop
    }

    fn desktop(&self, _notice: &Notice) {
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn error_toast(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

pub(crate) fn render_job(row: &JobRowView) -> String {
    let status = row
        .status
        .map(|status| status.label())
        .unwrap_or("Loading");
    let mut line = format!(
        "{:<38} {:<20} {:>3}%  {}",
        row.job_id, status, row.percent, row.progress_line
    );
    if row.failed > 0 {
        line.push_str(&format!("  ({} failed)", row.failed));
    }
    if let Some(error) = &row.error {
        line.push_str(&format!("  [{error}]"));
    }
    line
}

pub(crate) fn render_list(list: &ListView) -> Vec<String> {
    let mut lines: Vec<String> = list.jobs.iter().map(render_job).collect();
    if lines.is_empty() {
        lines.push("No batches yet".to_string());
    }
    if let Some(error) = &list.error {
        lines.push(format!("[{error}]"));
    }
    lines
}

pub(crate) fn render_notifications(view: &SyncViewModel) -> Vec<String> {
    let mut lines = vec![format!("Notifications ({} unread)", view.unread)];
    lines.extend(view.notifications.iter().map(|n| {
        let flag = if n.read { " " } else { "*" };
        format!("{flag} [{}] {}  -> {}", marker(n.severity), n.message, n.href)
    }));
    lines
}

pub(crate) fn render_history(rows: &[HistoryRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["No translations yet".to_string()];
    }
    rows.iter()
        .map(|row| match row {
            HistoryRow::Single {
                timestamp,
                target_lang,
                translated_image_url,
            } => format!("{timestamp}  single  {target_lang}  {translated_image_url}"),
            HistoryRow::Batch {
                timestamp,
                job_id,
                status,
                target_languages,
                completed,
                total,
            } => format!(
                "{timestamp}  batch   {}  {job_id}  {status}  {completed}/{total}",
                target_languages.join(",")
            ),
        })
        .collect()
}
