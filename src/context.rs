use crate::config::ControllerConfig;
use crate::events::{EventRecorder, EventType};
use crate::store::{ResourceStore, StoreObject};
use kube::ResourceExt;
use parking_lot::Mutex;
use std::collections::HashMap;

pub struct Context<S: ResourceStore> {
    store: S,
    config: ControllerConfig,
    recorder: EventRecorder,
    // namespace/name -> generation already reported as invalid
    rejected: Mutex<HashMap<String, Option<i64>>>,
}

impl<S: ResourceStore> Context<S> {
    pub fn new(store: S, config: ControllerConfig) -> Self {
        let recorder = EventRecorder::new(config.component.clone(), config.instance.clone());
        Self {
            store,
            config,
            recorder,
            rejected: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub async fn event<K: StoreObject>(&self, resource: &K, reason: &str, message: &str) {
        self.recorder
            .record(&self.store, resource, EventType::Normal, reason, message)
            .await
    }

    pub async fn warning<K: StoreObject>(&self, resource: &K, reason: &str, message: &str) {
        self.recorder
            .record(&self.store, resource, EventType::Warning, reason, message)
            .await
    }

    pub fn mark_rejected<K: StoreObject>(&self, resource: &K) -> bool {
        let key = format!("{}/{}", resource.namespace().unwrap_or_default(), resource.name_any());
        let generation = resource.meta().generation;
        self.rejected.lock().insert(key, generation) != Some(generation)
    }

    pub fn clear_rejected<K: StoreObject>(&self, resource: &K) {
        let key = format!("{}/{}", resource.namespace().unwrap_or_default(), resource.name_any());
        self.rejected.lock().remove(&key);
    }
}
