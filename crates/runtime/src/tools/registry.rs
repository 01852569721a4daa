//! Registry of the tools the model may call.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use super::{Tool, ToolSpec};

/// Name-keyed tools, in registration order.
///
/// Built once at startup and shared read-only afterwards. Adding a tool
/// means registering another [`Tool`] implementation; nothing else changes.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool of the same name in place.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let spec = tool.spec().clone();
        info!(tool = %spec.name, "registering tool");
        let (index, previous) = self.tools.insert_full(spec.name.clone(), tool);
        if previous.is_some() {
            self.specs[index] = spec;
        } else {
            self.specs.push(spec);
        }
    }

    /// Specs in a stable order, for advertising to the model.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTool;

    #[test]
    fn specs_follow_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(RecordingTool::new("b_tool", &["x"]));
        registry.register(RecordingTool::new("a_tool", &["y"]));

        let names: Vec<_> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b_tool", "a_tool"]);
        assert!(registry.lookup("a_tool").is_some());
        assert!(registry.lookup("c_tool").is_none());
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(RecordingTool::new("weather", &["city"]));
        registry.register(RecordingTool::new("news", &["city"]));
        registry.register(RecordingTool::new("weather", &["city", "date"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.specs()[0].name, "weather");
        assert_eq!(registry.specs()[0].parameters.len(), 2);
    }
}
