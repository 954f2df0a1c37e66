//! Shared test helpers for callback tests.

#![allow(dead_code)]

use hookstack_callbacks::{CallbackKind, CallbackRegistry, Flow};
use hookstack_model::{Cascadable, Document, DocumentState, RelationMetadata};
use std::sync::{Arc, Mutex};

/// Installs a test-friendly tracing subscriber once per test binary.
/// Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records handler invocations as `"<label>:<model>"`.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// A before/after handler that logs and continues.
    pub fn hook(&self, label: &str) -> impl Fn(&dyn Cascadable) -> Flow + Send + Sync + use<> {
        self.hook_with(label, Flow::Continue)
    }

    /// A before/after handler that logs and halts.
    pub fn halting(&self, label: &str) -> impl Fn(&dyn Cascadable) -> Flow + Send + Sync + use<> {
        self.hook_with(label, Flow::Halt)
    }

    fn hook_with(
        &self,
        label: &str,
        flow: Flow,
    ) -> impl Fn(&dyn Cascadable) -> Flow + Send + Sync + use<> {
        let log = self.clone();
        let label = label.to_string();
        move |doc: &dyn Cascadable| {
            log.push(format!("{label}:{}", doc.model_name()));
            flow
        }
    }
}

/// Registers logging before and after handlers for `kind` on each model.
pub fn log_phase(registry: &mut CallbackRegistry, log: &CallLog, kind: CallbackKind, models: &[&str]) {
    for model in models {
        registry
            .before(model, kind, log.hook(&format!("before_{kind}")))
            .unwrap();
        registry
            .after(model, kind, log.hook(&format!("after_{kind}")))
            .unwrap();
    }
}

/// A persisted document with the given relations declared as cascading.
pub fn persisted(model: &str, many: &[&str]) -> Document {
    many.iter().fold(
        Document::new(model).with_state(DocumentState::Persisted),
        |doc, relation| doc.embed(RelationMetadata::embeds_many(relation).cascade_callbacks(true)),
    )
}

pub fn leaf(model: &str, state: DocumentState) -> Document {
    Document::new(model).with_state(state)
}
