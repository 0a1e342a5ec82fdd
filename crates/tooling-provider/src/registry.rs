//! Producer registry.

use std::fmt;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::producer::ModelProducer;
use crate::producers::{ProviderInfoProducer, WorkspaceInventoryProducer};

/// Ordered set of model producers.
///
/// Resolution is first match in registration order. Producers should not
/// register overlapping models; when they do, the earlier one wins.
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    producers: Vec<Arc<dyn ModelProducer>>,
}

impl ProducerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in producers, minus any the config disables.
    pub fn builtin(config: &ProviderConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ProviderInfoProducer::new(config)));
        registry.register(Arc::new(WorkspaceInventoryProducer::new(&config.workspace_root)));

        if !config.disabled_models.is_empty() {
            registry
                .producers
                .retain(|p| !p.models().iter().any(|m| config.disabled_models.contains(m)));
        }
        registry
    }

    /// Append a producer.
    pub fn register(&mut self, producer: Arc<dyn ModelProducer>) -> &mut Self {
        self.producers.push(producer);
        self
    }

    /// The first producer that builds `model`.
    pub fn resolve(&self, model: &str) -> Option<Arc<dyn ModelProducer>> {
        self.producers.iter().find(|p| p.matches(model)).cloned()
    }

    /// Every model name advertised by the registered producers.
    pub fn model_names(&self) -> Vec<String> {
        self.producers.iter().flat_map(|p| p.models()).collect()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerRegistry")
            .field("models", &self.model_names())
            .finish()
    }
}
