//! Output rendering for streaming chat turns.
//!
//! This module provides the renderer trait the stream consumer drives while a
//! response arrives, plus a plain-text implementation with optional ANSI
//! styling. Chart events carry image references; the plain-text renderer
//! materializes `data:` URIs to files on disk so a terminal user has something
//! to open.

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for cyan text (used for tool names and charts).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering streaming chat output.
///
/// This abstraction allows for different rendering strategies: plain text with
/// ANSI styling, plain text for piping, or a silent renderer in tests.
pub trait Renderer: Send {
    /// Print a chunk of assistant response text.
    ///
    /// This is called incrementally as tokens are streamed from the backend.
    fn print_token(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Called when the backend attaches a chart to the streaming message.
    fn print_chart(&mut self, src: &str) {
        _ = src;
    }

    /// Called when the backend starts invoking a named tool.
    fn start_tool(&mut self, name: &str) {
        _ = name;
    }

    /// Called when the current tool invocation finishes.
    fn finish_tool(&mut self) {}

    /// Print an informational status line from the backend.
    fn print_status(&mut self, status: &str) {
        _ = status;
    }

    /// Print an informational message from the client itself.
    fn print_info(&mut self, info: &str) {
        _ = info;
    }

    /// Called when a turn is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_turn(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
///
/// Outputs directly to stdout. Charts arriving as `data:` URIs are decoded
/// and written to numbered files under the configured chart directory;
/// plain URLs are printed as-is.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    chart_dir: PathBuf,
    charts_written: usize,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            chart_dir: PathBuf::from("charts"),
            charts_written: 0,
            line_start: true,
        }
    }

    /// Sets the directory chart images are written to.
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = dir.into();
        self
    }

    /// Changes the chart directory at runtime.
    pub fn set_chart_dir(&mut self, dir: impl Into<PathBuf>) {
        self.chart_dir = dir.into();
    }

    /// Returns the configured chart directory.
    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn ensure_line_start(&mut self) {
        if !self.line_start {
            println!();
            self.line_start = true;
        }
    }

    fn print_styled_line(&mut self, style: &str, text: &str) {
        self.ensure_line_start();
        if self.use_color {
            println!("{style}{text}{ANSI_RESET}");
        } else {
            println!("{text}");
        }
        self.flush();
    }

    /// Decodes a base64 `data:` URI and writes it under the chart directory.
    fn save_data_uri(&mut self, src: &str) -> Result<PathBuf> {
        let rest = src
            .strip_prefix("data:")
            .ok_or_else(|| Error::validation("not a data URI", Some("src".to_string())))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::validation("data URI has no payload", Some("src".to_string())))?;
        if !meta.ends_with(";base64") {
            return Err(Error::validation(
                "data URI is not base64-encoded",
                Some("src".to_string()),
            ));
        }
        let extension = meta
            .split(';')
            .next()
            .and_then(|mime| mime.split('/').nth(1))
            .filter(|ext| !ext.is_empty() && ext.chars().all(char::is_alphanumeric))
            .unwrap_or("bin");

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| Error::encoding(format!("Invalid base64 in chart: {e}"), Some(Box::new(e))))?;

        fs::create_dir_all(&self.chart_dir)
            .map_err(|e| Error::io("failed to create chart directory", e))?;
        self.charts_written += 1;
        let path = self.chart_dir.join(format!("chart-{:03}.{}", self.charts_written, extension));
        fs::write(&path, bytes).map_err(|e| Error::io("failed to write chart file", e))?;
        Ok(path)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_token(&mut self, text: &str) {
        print!("{text}");
        if let Some(last) = text.chars().last() {
            self.line_start = last == '\n';
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.print_styled_line(ANSI_RED, error);
    }

    fn print_chart(&mut self, src: &str) {
        if src.starts_with("data:") {
            match self.save_data_uri(src) {
                Ok(path) => {
                    let line = format!("[chart saved: {}]", path.display());
                    self.print_styled_line(ANSI_CYAN, &line);
                }
                Err(err) => {
                    self.print_styled_line(ANSI_RED, &format!("[chart not saved: {err}]"));
                }
            }
        } else {
            self.print_styled_line(ANSI_CYAN, &format!("[chart: {src}]"));
        }
    }

    fn start_tool(&mut self, name: &str) {
        self.print_styled_line(ANSI_CYAN, &format!("[tool: {name}]"));
    }

    fn print_status(&mut self, status: &str) {
        self.print_styled_line(ANSI_DIM, status);
    }

    fn print_info(&mut self, info: &str) {
        self.print_styled_line(ANSI_DIM, info);
    }

    fn finish_turn(&mut self) {
        self.ensure_line_start();
        self.flush();
    }
}
