//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling client behavior. The backend base URL itself is
//! resolved by [`crate::BackendClient`] (flag, then FINCHAT_BACKEND_URL, then
//! a localhost default).

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default directory chart images are written to.
const DEFAULT_CHART_DIR: &str = "charts";

/// Command-line arguments for the finchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: $FINCHAT_BACKEND_URL or http://localhost:8000)", "URL")]
    pub backend: Option<String>,

    /// Directory to write chart images into.
    #[arrrg(optional, "Directory for chart images (default: charts)", "DIR")]
    pub chart_dir: Option<String>,

    /// Connection timeout in seconds.
    #[arrrg(optional, "Connection timeout in seconds (default: 10)", "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for the chat client.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL override. `None` defers to the environment variable
    /// or the localhost default.
    pub backend_url: Option<String>,

    /// Directory chart images are written to.
    pub chart_dir: PathBuf,

    /// Connection timeout override.
    pub connect_timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            backend_url: None,
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            connect_timeout: None,
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Sets the chart output directory.
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = dir.into();
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            backend_url: args.backend,
            chart_dir: args
                .chart_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_DIR)),
            connect_timeout: args.connect_timeout.map(Duration::from_secs),
            use_color: !args.no_color,
        }
    }
}
