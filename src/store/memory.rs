use super::{display_key, ResourceStore, StoreObject};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn of<K: StoreObject>(namespace: &str, name: &str) -> Self {
        Self {
            kind: K::kind(&()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Create,
    Update,
    UpdateStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Write {
    pub verb: Verb,
    pub key: ObjectKey,
}

struct Fault {
    verb: Verb,
    kind: String,
    message: String,
    skip: usize,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, Value>,
    version: u64,
    uids: u64,
    journal: Vec<Write>,
    faults: Vec<Fault>,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }

    fn take_fault(&mut self, verb: Verb, kind: &str) -> Option<Error> {
        let idx = self
            .faults
            .iter()
            .position(|f| f.verb == verb && f.kind == kind)?;
        if self.faults[idx].skip > 0 {
            self.faults[idx].skip -= 1;
            return None;
        }
        Some(Error::Store(self.faults.remove(idx).message))
    }

    fn check_version<K: StoreObject>(&self, key: &ObjectKey, object: &K) -> Result<&Value> {
        let stored = self
            .objects
            .get(key)
            .ok_or_else(|| Error::NotFound(display_key::<K>(&key.namespace, &key.name)))?;

        let found = stored["metadata"]["resourceVersion"]
            .as_str()
            .unwrap_or_default();
        // An object without a resourceVersion is an unconditional write.
        if let Some(expected) = object.meta().resource_version.as_deref() {
            if expected != found {
                return Err(Error::Conflict {
                    key: display_key::<K>(&key.namespace, &key.name),
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(stored)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: StoreObject>(&self, mut object: K) -> Result<K> {
        let key = key_of(&object)?;
        let mut inner = self.inner.lock();

        if object.meta().uid.is_none() {
            inner.uids += 1;
            object.meta_mut().uid = Some(format!("uid-{}", inner.uids));
        }
        object.meta_mut().resource_version = Some(inner.next_version());

        let value = serde_json::to_value(&object)?;
        inner.objects.insert(key, value);
        Ok(object)
    }

    pub fn object<K: StoreObject>(&self, namespace: &str, name: &str) -> Option<K> {
        let inner = self.inner.lock();
        inner
            .objects
            .get(&ObjectKey::of::<K>(namespace, name))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn list<K: StoreObject>(&self, namespace: &str) -> Vec<K> {
        let kind = K::kind(&());
        let inner = self.inner.lock();
        inner
            .objects
            .iter()
            .filter(|(k, _)| k.kind == kind && k.namespace == namespace)
            .filter_map(|(_, v)| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    pub fn fail_next<K: StoreObject>(&self, verb: Verb, message: impl Into<String>) {
        self.fail_nth::<K>(verb, 1, message)
    }

    pub fn fail_nth<K: StoreObject>(&self, verb: Verb, n: usize, message: impl Into<String>) {
        self.inner.lock().faults.push(Fault {
            verb,
            kind: K::kind(&()).to_string(),
            message: message.into(),
            skip: n.saturating_sub(1),
        });
    }

    pub fn journal(&self) -> Vec<Write> {
        self.inner.lock().journal.clone()
    }

    pub fn take_journal(&self) -> Vec<Write> {
        std::mem::take(&mut self.inner.lock().journal)
    }

    pub fn writes_to<K: StoreObject>(&self) -> Vec<Write> {
        let kind = K::kind(&());
        self.journal()
            .into_iter()
            .filter(|w| w.key.kind == kind)
            .collect()
    }
}

fn key_of<K: StoreObject>(object: &K) -> Result<ObjectKey> {
    let meta = object.meta();
    let name = meta.name.as_deref().ok_or(Error::MissingField("metadata.name"))?;
    let namespace = meta
        .namespace
        .as_deref()
        .ok_or(Error::MissingField("metadata.namespace"))?;
    Ok(ObjectKey::of::<K>(namespace, name))
}

fn decode<K: StoreObject>(value: Value) -> Result<K> {
    serde_json::from_value(value).map_err(Error::Serialization)
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_fault(Verb::Get, &K::kind(&())) {
            return Err(err);
        }

        inner
            .objects
            .get(&ObjectKey::of::<K>(namespace, name))
            .cloned()
            .map(decode)
            .transpose()
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<K> {
        let key = key_of(object)?;
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_fault(Verb::Create, &key.kind) {
            return Err(err);
        }
        if inner.objects.contains_key(&key) {
            return Err(Error::AlreadyExists(display_key::<K>(
                &key.namespace,
                &key.name,
            )));
        }

        let mut created = object.clone();
        inner.uids += 1;
        created.meta_mut().uid = Some(format!("uid-{}", inner.uids));
        created.meta_mut().resource_version = Some(inner.next_version());

        let value = serde_json::to_value(&created)?;
        debug!("Created {}/{} {}", key.namespace, key.name, key.kind);
        inner.objects.insert(key.clone(), value);
        inner.journal.push(Write {
            verb: Verb::Create,
            key,
        });
        Ok(created)
    }

    async fn update<K: StoreObject>(&self, object: &K) -> Result<K> {
        let key = key_of(object)?;
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_fault(Verb::Update, &key.kind) {
            return Err(err);
        }
        let stored = inner.check_version(&key, object)?;
        let status = stored.get("status").cloned();
        let uid = stored["metadata"]["uid"].clone();

        let mut value = serde_json::to_value(object)?;
        match status {
            Some(status) => value["status"] = status,
            None => {
                if let Some(map) = value.as_object_mut() {
                    map.remove("status");
                }
            }
        }
        value["metadata"]["uid"] = uid;
        value["metadata"]["resourceVersion"] = Value::String(inner.next_version());

        let updated = decode::<K>(value.clone())?;
        inner.objects.insert(key.clone(), value);
        inner.journal.push(Write {
            verb: Verb::Update,
            key,
        });
        Ok(updated)
    }

    async fn update_status<K: StoreObject>(&self, object: &K) -> Result<K> {
        let key = key_of(object)?;
        let mut inner = self.inner.lock();
        if let Some(err) = inner.take_fault(Verb::UpdateStatus, &key.kind) {
            return Err(err);
        }
        let mut value = inner.check_version(&key, object)?.clone();

        let status = serde_json::to_value(object)?
            .get("status")
            .cloned()
            .unwrap_or(Value::Null);
        value["status"] = status;
        value["metadata"]["resourceVersion"] = Value::String(inner.next_version());

        let updated = decode::<K>(value.clone())?;
        inner.objects.insert(key.clone(), value);
        inner.journal.push(Write {
            verb: Verb::UpdateStatus,
            key,
        });
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Service, ServiceSpec, ServiceStatus};
    use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus};
    use kube::api::ObjectMeta;

    fn service(name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("ns".into()),
                ..Default::default()
            },
            spec: Some(ServiceSpec::default()),
            ..Default::default()
        }
    }

    fn ingress_status(ip: &str) -> ServiceStatus {
        ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some(ip.into()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_uid_and_version() {
        let store = MemoryStore::new();
        let created = store.create(&service("a")).await.unwrap();

        assert!(created.metadata.uid.is_some());
        assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));
        assert!(matches!(
            store.create(&service("a")).await,
            Err(Error::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryStore::new();
        let found: Option<Service> = store.get("ns", "nope").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let store = MemoryStore::new();
        let created = store.create(&service("a")).await.unwrap();

        let mut first = created.clone();
        first.metadata.labels = Some([("x".to_string(), "1".to_string())].into());
        store.update(&first).await.unwrap();

        let err = store.update(&created).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn update_keeps_status_and_status_write_keeps_spec() {
        let store = MemoryStore::new();
        let created = store.create(&service("a")).await.unwrap();

        let mut with_status = created.clone();
        with_status.status = Some(ingress_status("1.2.3.4"));
        with_status.spec.as_mut().unwrap().cluster_ip = Some("ignored".into());
        let after_status = store.update_status(&with_status).await.unwrap();
        assert_eq!(after_status.status, Some(ingress_status("1.2.3.4")));
        assert_eq!(after_status.spec.unwrap().cluster_ip, None);

        let mut spec_change = store.object::<Service>("ns", "a").unwrap();
        spec_change.status = None;
        spec_change.spec.as_mut().unwrap().cluster_ip = Some("10.0.0.1".into());
        let after_update = store.update(&spec_change).await.unwrap();
        assert_eq!(after_update.status, Some(ingress_status("1.2.3.4")));
        assert_eq!(
            after_update.spec.unwrap().cluster_ip.as_deref(),
            Some("10.0.0.1")
        );
    }

    #[tokio::test]
    async fn queued_fault_fails_once() {
        let store = MemoryStore::new();
        store.fail_next::<Service>(Verb::Create, "boom");

        assert!(matches!(
            store.create(&service("a")).await,
            Err(Error::Store(m)) if m == "boom"
        ));
        store.create(&service("a")).await.unwrap();
        assert_eq!(store.writes_to::<Service>().len(), 1);
    }

    #[tokio::test]
    async fn nth_fault_lets_earlier_calls_through() {
        let store = MemoryStore::new();
        store.create(&service("a")).await.unwrap();
        store.fail_nth::<Service>(Verb::Get, 2, "later");

        let first: Option<Service> = store.get("ns", "a").await.unwrap();
        assert!(first.is_some());
        assert!(store.get::<Service>("ns", "a").await.is_err());
        assert!(store.get::<Service>("ns", "a").await.is_ok());
    }
}
