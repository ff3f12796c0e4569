mod autoprefixer;
mod document_resolver;
mod registry;

pub use autoprefixer::AutoprefixerPlugin;
pub use document_resolver::DocumentResolverPlugin;
pub use registry::PluginRegistry;

use std::io;
use std::path::Path;

/// A preprocessing engine plugin
pub trait Plugin: Send + Sync {
    /// Plugin identifier (e.g., "autoprefixer")
    fn name(&self) -> &str;

    /// Extra arguments this plugin contributes to a `lessc` invocation.
    ///
    /// `scratch` is a directory private to the invocation where the plugin
    /// may write files the arguments refer to.
    fn lessc_args(&self, _scratch: &Path) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
