//! Output formatters for different output modes.
//!
//! Text output is meant for people watching a simulation, JSON buffers the
//! events into one document at the end, and NDJSON streams one event per line.

use super::events::{LifecycleEvent, SummaryInfo};
use crate::models::OutputFormat;
use std::io::{self, Write};

/// Trait for formatting and writing output events.
pub trait OutputFormatter {
    /// Writes a lifecycle event to the output.
    fn write_event(&mut self, event: &LifecycleEvent) -> io::Result<()>;

    /// Writes the final summary.
    fn write_summary(&mut self, summary: &SummaryInfo) -> io::Result<()>;

    /// Flushes any buffered output.
    fn flush(&mut self) -> io::Result<()>;
}

/// Writer that formats output according to the specified format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    quiet: bool,
    events: Vec<LifecycleEvent>,
}

impl<W: Write> OutputWriter<W> {
    /// Creates a new OutputWriter with the specified format.
    ///
    /// In quiet mode text output skips resize notifications.
    pub fn new(writer: W, format: OutputFormat, quiet: bool) -> Self {
        Self {
            writer,
            format,
            quiet,
            events: Vec::new(),
        }
    }

    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn writeln(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)
    }

    fn write_text_event(&mut self, event: &LifecycleEvent) -> io::Result<()> {
        match event {
            LifecycleEvent::Start {
                width,
                height,
                states,
                rejected,
            } => {
                self.writeln(&format!(
                    "Tracking {} state(s) at {}x{}: {}",
                    states.len(),
                    width,
                    height,
                    states.join(", ")
                ))?;
                if !rejected.is_empty() {
                    self.writeln(&format!(" ⊘ rejected: {}", rejected.join(", ")))?;
                }
            }
            LifecycleEvent::Viewport { width, height } => {
                self.writeln("")?;
                self.writeln(&format!("Viewport → {}x{}", width, height))?;
            }
            LifecycleEvent::FirstRun { state } => {
                self.writeln(&format!(" ★ {} first run", state))?;
            }
            LifecycleEvent::Enter { state } => {
                self.writeln(&format!(" ✓ {} entered", state))?;
            }
            LifecycleEvent::Leave { state } => {
                self.writeln(&format!(" ✗ {} left", state))?;
            }
            LifecycleEvent::Resize { state } => {
                self.writeln(&format!(" ↔ {} resized", state))?;
            }
            LifecycleEvent::StateChange => {
                self.writeln(" • state change")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> OutputFormatter for OutputWriter<W> {
    fn write_event(&mut self, event: &LifecycleEvent) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                if !(self.quiet && event.is_resize()) {
                    self.write_text_event(event)?;
                }
            }
            OutputFormat::Json => {
                self.events.push(event.clone());
            }
            OutputFormat::Ndjson => {
                let json = serde_json::to_string(event).map_err(io::Error::other)?;
                self.writeln(&json)?;
            }
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &SummaryInfo) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                self.writeln("")?;
                self.writeln("═══════════════════════════════════════════════════════════")?;
                self.writeln(&format!(
                    "Final viewport: {}x{}",
                    summary.width, summary.height
                ))?;
                let active = if summary.active.is_empty() {
                    "(none)".to_string()
                } else {
                    summary.active.join(", ")
                };
                self.writeln(&format!("Active states:  {}", active))?;
                self.writeln(&format!(
                    "Callbacks:      {} enter, {} leave, {} resize, {} state change",
                    summary.counts.enters,
                    summary.counts.leaves,
                    summary.counts.resizes,
                    summary.counts.state_changes
                ))?;
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "summary": summary,
                    "events": self.events
                });
                let json = serde_json::to_string_pretty(&output).map_err(io::Error::other)?;
                self.writeln(&json)?;
            }
            OutputFormat::Ndjson => {
                let json = serde_json::to_string(summary).map_err(io::Error::other)?;
                self.writeln(&json)?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::SummaryCounts;

    fn sample_events() -> Vec<LifecycleEvent> {
        vec![
            LifecycleEvent::Start {
                width: 800,
                height: 600,
                states: vec!["lg".to_string(), "sm".to_string()],
                rejected: vec!["print".to_string()],
            },
            LifecycleEvent::FirstRun {
                state: "sm".to_string(),
            },
            LifecycleEvent::Enter {
                state: "sm".to_string(),
            },
            LifecycleEvent::Viewport {
                width: 1280,
                height: 600,
            },
            LifecycleEvent::Leave {
                state: "sm".to_string(),
            },
            LifecycleEvent::StateChange,
            LifecycleEvent::Resize {
                state: "lg".to_string(),
            },
        ]
    }

    fn sample_summary() -> SummaryInfo {
        SummaryInfo {
            width: 1280,
            height: 600,
            active: vec!["lg".to_string()],
            counts: SummaryCounts::from_events(&sample_events()),
        }
    }

    /// # Text Output
    ///
    /// Snapshot of the human readable rendering of a short run.
    #[test]
    fn test_text_output_snapshot() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Text, false);
        for event in sample_events() {
            writer.write_event(&event).unwrap();
        }
        writer.write_summary(&sample_summary()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        insta::assert_snapshot!(output, @r"
        Tracking 2 state(s) at 800x600: lg, sm
         ⊘ rejected: print
         ★ sm first run
         ✓ sm entered

        Viewport → 1280x600
         ✗ sm left
         • state change
         ↔ lg resized

        ═══════════════════════════════════════════════════════════
        Final viewport: 1280x600
        Active states:  lg
        Callbacks:      1 enter, 1 leave, 1 resize, 1 state change
        ");
    }

    #[test]
    fn test_quiet_text_skips_resize_events() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Text, true);
        assert!(writer.is_quiet());
        for event in sample_events() {
            writer.write_event(&event).unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("sm left"));
        assert!(!output.contains("resized"));
    }

    /// # NDJSON Output
    ///
    /// ## Expected Outcome
    /// - One JSON document per event, summary last
    #[test]
    fn test_ndjson_output_lines() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Ndjson, false);
        for event in sample_events() {
            writer.write_event(&event).unwrap();
        }
        writer.write_summary(&sample_summary()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), sample_events().len() + 1);
        for line in &lines {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
        assert!(lines[2].contains(r#""event":"enter""#));
        assert!(lines.last().unwrap().contains(r#""active":["lg"]"#));
    }

    /// # JSON Output Buffers Events
    #[test]
    fn test_json_output_buffers_until_summary() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        for event in sample_events() {
            writer.write_event(&event).unwrap();
        }
        assert_eq!(writer.format(), &OutputFormat::Json);
        writer.write_summary(&sample_summary()).unwrap();
        writer.flush().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["events"].as_array().unwrap().len(), 7);
        assert_eq!(value["summary"]["active"][0], "lg");
        assert_eq!(value["summary"]["counts"]["leaves"], 1);
    }
}
