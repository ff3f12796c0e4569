use super::{AutoprefixerPlugin, DocumentResolverPlugin, Plugin};
use crate::documents::Documents;
use crate::types::Options;
use std::sync::Arc;

/// Ordered plugin sequence for a single render
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Build the plugin sequence for one compile.
    ///
    /// The autoprefixer comes first when `autoprefixer` is set; the document
    /// resolver is always last. Nothing is shared with earlier compiles.
    pub fn for_options(options: &Options, documents: Arc<dyn Documents>) -> Self {
        let mut registry = Self::new();

        if let Some(browsers) = options.autoprefixer_browsers() {
            registry.register(Arc::new(AutoprefixerPlugin::new(&browsers)));
        }
        registry.register(Arc::new(DocumentResolverPlugin::new(documents)));

        registry
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Get names of all registered plugins
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn into_plugins(self) -> Vec<Arc<dyn Plugin>> {
        self.plugins
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
