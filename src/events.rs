use crate::store::{ResourceStore, StoreObject};
use k8s_openapi::api::core::v1::{Event, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use chrono::Utc;
use kube::api::ObjectMeta;
use kube::ResourceExt;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

impl EventType {
    fn as_str(&self) -> &'static str {
        match self {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        }
    }
}

pub mod reasons {
    pub const CREATED: &str = "Created";
    pub const UPDATED: &str = "Updated";
    pub const INVALID_SPEC: &str = "InvalidSpec";
}

#[derive(Debug)]
pub struct EventRecorder {
    component: String,
    instance: String,
    last_stamp: AtomicI64,
}

impl EventRecorder {
    pub fn new(component: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            instance: instance.into(),
            last_stamp: AtomicI64::new(0),
        }
    }

    fn next_stamp(&self, nanos: i64) -> i64 {
        let previous = self
            .last_stamp
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(nanos.max(last + 1))
            })
            .unwrap_or(nanos);
        nanos.max(previous + 1)
    }

    pub fn build<K: StoreObject>(
        &self,
        resource: &K,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) -> Event {
        let now = Utc::now();
        let name = resource.name_any();
        let namespace = resource.namespace().unwrap_or_default();

        Event {
            metadata: ObjectMeta {
                name: Some(format!(
                    "{}.{:x}",
                    name,
                    self.next_stamp(now.timestamp_nanos_opt().unwrap_or_default())
                )),
                namespace: Some(namespace.clone()),
                ..Default::default()
            },
            involved_object: ObjectReference {
                api_version: Some(K::api_version(&()).to_string()),
                kind: Some(K::kind(&()).to_string()),
                name: Some(name),
                namespace: Some(namespace),
                uid: resource.uid(),
                resource_version: resource.resource_version(),
                ..Default::default()
            },
            type_: Some(event_type.as_str().to_string()),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            first_timestamp: Some(Time(now)),
            last_timestamp: Some(Time(now)),
            count: Some(1),
            reporting_component: Some(self.component.clone()),
            reporting_instance: Some(self.instance.clone()),
            ..Default::default()
        }
    }

    /// Writes the event. Failures are logged and swallowed: an event that
    /// cannot be recorded never fails a reconcile.
    pub async fn record<S, K>(
        &self,
        store: &S,
        resource: &K,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) where
        S: ResourceStore,
        K: StoreObject,
    {
        let event = self.build(resource, event_type, reason, message);
        match store.create(&event).await {
            Ok(_) => debug!(
                "Recorded event: {} - {} for {}",
                event_type.as_str(),
                reason,
                resource.name_any()
            ),
            Err(e) => warn!(
                "Failed to record {} event {} for {}: {}",
                event_type.as_str(),
                reason,
                resource.name_any(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{MongoDB, MongoDBSpec};

    #[test]
    fn event_refers_to_resource() {
        let mut db = MongoDB::new("db1", MongoDBSpec::default());
        db.metadata.namespace = Some("ns".into());
        db.metadata.uid = Some("u1".into());

        let recorder = EventRecorder::new("mongodb-operator", "pod-0");
        let event = recorder.build(&db, EventType::Warning, reasons::INVALID_SPEC, "bad");

        assert_eq!(event.metadata.namespace.as_deref(), Some("ns"));
        assert!(event.metadata.name.unwrap().starts_with("db1."));
        assert_eq!(event.involved_object.kind.as_deref(), Some("MongoDB"));
        assert_eq!(event.involved_object.uid.as_deref(), Some("u1"));
        assert_eq!(event.type_.as_deref(), Some("Warning"));
        assert_eq!(event.reason.as_deref(), Some("InvalidSpec"));
        assert_eq!(event.reporting_component.as_deref(), Some("mongodb-operator"));
    }

    #[test]
    fn names_are_unique_within_a_tick() {
        let db = MongoDB::new("db1", MongoDBSpec::default());
        let recorder = EventRecorder::new("mongodb-operator", "pod-0");

        let first = recorder.next_stamp(100);
        let second = recorder.next_stamp(100);
        assert!(second > first);
        assert_ne!(
            recorder.build(&db, EventType::Normal, reasons::CREATED, "a").metadata.name,
            recorder.build(&db, EventType::Normal, reasons::CREATED, "b").metadata.name
        );
    }
}
