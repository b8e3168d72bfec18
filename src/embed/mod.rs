//! Embedded static resources for mira.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server assets (delta-streamer.js)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{DELTA_STREAMER_JS, StreamerVars};
//!
//! let js = DELTA_STREAMER_JS.render(&StreamerVars {
//!     scheme_suffix: "",
//!     ws_port: 35900,
//!     ws_path: "/delta-streamer-ws".to_string(),
//!     force_reload: false,
//! });
//! ```

mod template;

// Re-export core types
pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// File name of the emitted client script, at the mirror root.
    pub const STREAMER_FILE_NAME: &str = "delta-streamer.js";

    /// Script tag spliced into mirrored HTML documents, directly before
    /// the closing head tag.
    pub const STREAMER_TAG: &str = "<!-- injected by mira to stream change deltas -->\n\
        <script type=\"module\" src=\"/delta-streamer.js\"></script>";

    /// Variables for delta-streamer.js.
    pub struct StreamerVars {
        /// `""` for plain transport, `"s"` when TLS termination is expected
        /// in front of the server (`ws://` vs `wss://`).
        pub scheme_suffix: &'static str,
        /// Port the WebSocket listener is bound to.
        pub ws_port: u16,
        /// Request path clients connect on.
        pub ws_path: String,
        /// Reload every attached page on any change, not just the changed one.
        pub force_reload: bool,
    }

    impl TemplateVars for StreamerVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__WS_SCHEME_SUFFIX__", self.scheme_suffix)
                .replace("__WS_PORT__", &self.ws_port.to_string())
                .replace("__WS_PATH__", &self.ws_path)
                .replace(
                    "__FORCE_RELOAD__",
                    if self.force_reload { "true" } else { "false" },
                )
        }
    }

    /// Client-side reload script with connection parameter injection.
    pub const DELTA_STREAMER_JS: Template<StreamerVars> =
        Template::new(include_str!("serve/delta-streamer.js"));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::serve::{DELTA_STREAMER_JS, StreamerVars};

    #[test]
    fn test_streamer_params_substituted_verbatim() {
        let js = DELTA_STREAMER_JS.render(&StreamerVars {
            scheme_suffix: "s",
            ws_port: 4242,
            ws_path: "/delta-streamer-ws".to_string(),
            force_reload: true,
        });

        assert!(js.contains("wss://"));
        assert!(js.contains(":4242/delta-streamer-ws"));
        assert!(js.contains("const forceReload = true;"));
        assert!(!js.contains("__WS_PORT__"));
    }

    #[test]
    fn test_streamer_plain_scheme() {
        let js = DELTA_STREAMER_JS.render(&StreamerVars {
            scheme_suffix: "",
            ws_port: 35900,
            ws_path: "/ws".to_string(),
            force_reload: false,
        });

        assert!(js.contains("ws://"));
        assert!(!js.contains("wss://"));
        assert!(js.contains("const forceReload = false;"));
    }
}
