use super::Plugin;
use crate::types::normalize_browsers;
use std::io;
use std::path::Path;

/// Adds vendor prefixes for the configured browser queries
pub struct AutoprefixerPlugin {
    browsers: String,
}

impl AutoprefixerPlugin {
    /// `browsers` may be separated by `,` or `;`
    pub fn new(browsers: &str) -> Self {
        Self { browsers: normalize_browsers(browsers) }
    }

    pub fn browsers(&self) -> &str {
        &self.browsers
    }
}

impl Plugin for AutoprefixerPlugin {
    fn name(&self) -> &str {
        "autoprefixer"
    }

    fn lessc_args(&self, _scratch: &Path) -> io::Result<Vec<String>> {
        if self.browsers.is_empty() {
            Ok(vec!["--autoprefix".to_string()])
        } else {
            Ok(vec![format!("--autoprefix={}", self.browsers)])
        }
    }
}
