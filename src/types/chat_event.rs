use serde::{Deserialize, Serialize};

/// A typed event from the backend's chat stream.
///
/// Events arrive as JSON objects with a `type` discriminator. The original
/// wire format is stringly typed; modeling it as a tagged enum gives us an
/// exhaustive match at every dispatch site, with `Unknown` absorbing event
/// types this client does not recognize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A piece of assistant response text to append to the streaming message.
    Token {
        /// The token text.
        content: String,
    },

    /// A chart image produced by the backend.
    Chart {
        /// Image reference: a URL or a `data:` URI.
        src: String,
    },

    /// The backend started invoking a named tool.
    ToolStart {
        /// The tool's name.
        tool: String,
    },

    /// The backend finished the current tool invocation.
    ToolEnd,

    /// Informational progress message. Carries no state change.
    Status {
        /// Human-readable status text, if the backend supplied one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// The turn completed normally.
    Done,

    /// The backend reported an application error for this turn.
    Error {
        /// The error description.
        content: String,
    },

    /// An event type this client does not recognize. Ignored.
    #[serde(other)]
    Unknown,
}
