//! Pipeline status and diagnostic reporting.
//!
//! The harvester and filter report what they are doing (and what went
//! wrong for individual items) through [`PipelineReporter`] instead of
//! printing directly, so tests can capture or silence diagnostics.
//! Events are emitted on **stderr** so stdout remains parseable.

use std::io::Write;

/// A single observable event from the harvest/filter pipeline.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    /// The mailbox is being searched with the given query.
    Listing { query: String },
    /// Attachment n of total is being extracted and judged.
    Checking {
        filename: String,
        n: usize,
        total: usize,
    },
    /// The judge shortlisted this attachment.
    Accepted { filename: String },
    /// The judge rejected this attachment.
    Rejected { filename: String },
    /// A non-fatal fault: extraction failure, provider error, bad data.
    Warning { message: String },
}

/// Receives pipeline events. Implementations decide where they go.
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent);

    /// Convenience for the common warning case.
    fn warn(&self, message: &str) {
        self.report(PipelineEvent::Warning {
            message: message.to_string(),
        });
    }
}

/// Renders an event as a single human-readable line.
fn render(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Listing { query } => format!("fetch  searching mailbox: {}\n", query),
        PipelineEvent::Checking { filename, n, total } => {
            format!("fetch  checking {} / {}: {}\n", n, total, filename)
        }
        PipelineEvent::Accepted { filename } => format!("fetch  shortlisted: {}\n", filename),
        PipelineEvent::Rejected { filename } => format!("fetch  rejected: {}\n", filename),
        PipelineEvent::Warning { message } => format!("warning: {}\n", message),
    }
}

/// Human-readable event lines on stderr.
pub struct StderrReporter;

impl PipelineReporter for StderrReporter {
    fn report(&self, event: PipelineEvent) {
        let line = render(&event);
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// No-op reporter for `--quiet` runs and tests.
pub struct NoReporter;

impl PipelineReporter for NoReporter {
    fn report(&self, _event: PipelineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lines() {
        assert_eq!(
            render(&PipelineEvent::Listing {
                query: "label:CVs".to_string()
            }),
            "fetch  searching mailbox: label:CVs\n"
        );
        assert_eq!(
            render(&PipelineEvent::Checking {
                filename: "cv.pdf".to_string(),
                n: 2,
                total: 5
            }),
            "fetch  checking 2 / 5: cv.pdf\n"
        );
        assert_eq!(
            render(&PipelineEvent::Warning {
                message: "boom".to_string()
            }),
            "warning: boom\n"
        );
    }
}
