use super::Plugin;
use crate::documents::Documents;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Script handed to `lessc --plugin=`
const PLUGIN_FILE: &str = "document-resolver.js";

/// Lets the engine see unsaved editor contents.
///
/// Imported files that are open in the editor are compiled from their live
/// text; everything else keeps the on-disk source the engine loaded. The
/// root file is left alone since its text is supplied by the caller.
pub struct DocumentResolverPlugin {
    documents: Arc<dyn Documents>,
}

impl DocumentResolverPlugin {
    pub fn new(documents: Arc<dyn Documents>) -> Self {
        Self { documents }
    }
}

/// A Less pre-processor that swaps an imported file's source for its open
/// text, keyed by the import's absolute normalized path
fn plugin_source(documents: &str) -> String {
    format!(
        r#"var path = require('path');
var documents = {documents};

module.exports = {{
  install: function (less, pluginManager) {{
    pluginManager.addPreProcessor({{
      process: function (src, extra) {{
        var info = extra.fileInfo;
        if (!info || info.filename === info.rootFilename) {{
          return src;
        }}
        var file = path.normalize(path.resolve(info.entryPath || '', info.filename));
        return Object.prototype.hasOwnProperty.call(documents, file) ? documents[file] : src;
      }}
    }}, 2000);
  }}
}};
"#
    )
}

impl Plugin for DocumentResolverPlugin {
    fn name(&self) -> &str {
        "document-resolver"
    }

    fn lessc_args(&self, scratch: &Path) -> io::Result<Vec<String>> {
        let open = self.documents.snapshot();
        if open.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Map<String, Value> = open
            .into_iter()
            .map(|(path, text)| (path.to_string_lossy().into_owned(), Value::String(text)))
            .collect();
        let documents = serde_json::to_string(&documents)?;

        let script = scratch.join(PLUGIN_FILE);
        fs::write(&script, plugin_source(&documents))?;

        Ok(vec![format!("--plugin={}", script.display())])
    }
}
