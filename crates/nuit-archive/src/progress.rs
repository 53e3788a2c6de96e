//! Console progress markers on stderr: `#` per page fetched, `.` per new
//! track or stored picture.

use nuit_core::ScrapeEvent;
use std::io::Write;

pub fn marker(event: &ScrapeEvent) -> Option<char> {
    match event {
        ScrapeEvent::PageFetched { .. } => Some('#'),
        ScrapeEvent::TrackFound { .. } | ScrapeEvent::PictureStored { .. } => Some('.'),
        ScrapeEvent::Stalled { .. } => None,
    }
}

pub fn console(event: ScrapeEvent) {
    if let Some(c) = marker(&event) {
        let mut stderr = std::io::stderr().lock();
        // Progress output is best effort.
        let _ = write!(stderr, "{}", c);
        let _ = stderr.flush();
    }
}

/// Terminate the marker line so log output starts on a fresh one.
pub fn end_line() {
    eprintln!();
}
