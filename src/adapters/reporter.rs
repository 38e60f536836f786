use crate::domain::model::{ErrorKind, ScanState, Verdict};
use crate::domain::ports::ScanReporter;

/// Prints the verdict or the error to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    show_progress: bool,
}

impl ConsoleReporter {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }
}

impl ScanReporter for ConsoleReporter {
    fn on_state_change(&self, state: &ScanState) {
        if !self.show_progress {
            return;
        }
        let label = match state {
            ScanState::Extracting => "🔍 Reading label text...",
            ScanState::Translating => "🌐 Translating...",
            ScanState::Matching => "🧪 Checking allergens...",
            _ => return,
        };
        eprintln!("{}", label);
    }

    fn report_verdict(&self, verdict: &Verdict) {
        let icon = if verdict.is_safe() { "✅" } else { "⚠️" };
        println!("{} {}", icon, verdict.message());
    }

    fn report_error(&self, error: &ErrorKind) {
        eprintln!("❌ {}", error.user_message());
    }
}
