use crate::crd::MongoDB;
use crate::error::Result;
use crate::generator::DesiredState;
use crate::merge::{self, Merge};
use crate::ownership::{is_controlled_by, set_controller_reference};
use crate::store::{ResourceStore, StoreObject};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::fmt;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    Created,
    Updated,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildOutcome {
    pub kind: &'static str,
    pub name: String,
    pub convergence: Convergence,
}

#[async_trait]
pub trait ChildHandler: Send + Sync {
    type Object: StoreObject;

    const KIND: &'static str;

    fn generate(&self, desired: &DesiredState) -> Self::Object;

    fn merge(&self, generated: &Self::Object, live: &Self::Object) -> Merge<Self::Object>;

    async fn fetch<S: ResourceStore>(
        &self,
        store: &S,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Self::Object>> {
        store.get::<Self::Object>(namespace, name).await
    }

    async fn apply<S: ResourceStore>(
        &self,
        store: &S,
        parent: &MongoDB,
        generated: Self::Object,
        live: Option<Self::Object>,
    ) -> Result<Convergence> {
        let namespace = generated.namespace().unwrap_or_default();
        let name = generated.name_any();

        match live {
            None => {
                let mut child = generated;
                set_controller_reference(parent, &mut child)?;
                info!("Creating {} {}/{}", Self::KIND, namespace, name);
                store.create(&child).await?;
                Ok(Convergence::Created)
            }
            Some(live) => {
                let mut merged = match self.merge(&generated, &live) {
                    Merge::Unchanged if is_controlled_by(parent, &live) => {
                        debug!("{} {}/{} is up to date", Self::KIND, namespace, name);
                        return Ok(Convergence::Unchanged);
                    }
                    // Owned fields match but the child is not ours yet.
                    Merge::Unchanged => live,
                    Merge::Update(merged) => merged,
                };
                set_controller_reference(parent, &mut merged)?;
                info!("Updating {} {}/{}", Self::KIND, namespace, name);
                store.update(&merged).await?;
                Ok(Convergence::Updated)
            }
        }
    }

    async fn converge<S: ResourceStore>(
        &self,
        store: &S,
        parent: &MongoDB,
        desired: &DesiredState,
    ) -> Result<ChildOutcome> {
        let generated = self.generate(desired);
        let namespace = generated.namespace().unwrap_or_default();
        let name = generated.name_any();

        let live = self.fetch(store, &namespace, &name).await?;
        let convergence = self.apply(store, parent, generated, live).await?;

        Ok(ChildOutcome {
            kind: Self::KIND,
            name,
            convergence,
        })
    }
}

pub struct ServiceHandler;

#[async_trait]
impl ChildHandler for ServiceHandler {
    type Object = Service;

    const KIND: &'static str = "Service";

    fn generate(&self, desired: &DesiredState) -> Service {
        desired.service.clone()
    }

    fn merge(&self, generated: &Service, live: &Service) -> Merge<Service> {
        merge::merge_service(generated, live)
    }
}

pub struct StatefulSetHandler;

#[async_trait]
impl ChildHandler for StatefulSetHandler {
    type Object = StatefulSet;

    const KIND: &'static str = "StatefulSet";

    fn generate(&self, desired: &DesiredState) -> StatefulSet {
        desired.stateful_set.clone()
    }

    fn merge(&self, generated: &StatefulSet, live: &StatefulSet) -> Merge<StatefulSet> {
        merge::merge_stateful_set(generated, live)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Child {
    Service,
    StatefulSet,
}

impl Child {
    pub const ALL: [Child; 2] = [Child::Service, Child::StatefulSet];

    pub async fn converge<S: ResourceStore>(
        self,
        store: &S,
        parent: &MongoDB,
        desired: &DesiredState,
    ) -> Result<ChildOutcome> {
        match self {
            Child::Service => ServiceHandler.converge(store, parent, desired).await,
            Child::StatefulSet => StatefulSetHandler.converge(store, parent, desired).await,
        }
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Service => f.write_str(ServiceHandler::KIND),
            Child::StatefulSet => f.write_str(StatefulSetHandler::KIND),
        }
    }
}

pub async fn converge_all<S: ResourceStore>(
    store: &S,
    parent: &MongoDB,
    desired: &DesiredState,
) -> Result<Vec<ChildOutcome>> {
    let mut outcomes = Vec::with_capacity(Child::ALL.len());
    for child in Child::ALL {
        outcomes.push(child.converge(store, parent, desired).await?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::MongoDBSpec;
    use crate::error::Error;
    use crate::generator::{self, service_name, stateful_set_name};
    use crate::store::{MemoryStore, Verb};

    fn seeded(store: &MemoryStore) -> MongoDB {
        let mut db = MongoDB::new("db1", MongoDBSpec::new(3, "50Gi"));
        db.metadata.namespace = Some("ns".into());
        store.insert(db).unwrap()
    }

    #[tokio::test]
    async fn creates_missing_children_in_order() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);

        let outcomes = converge_all(&store, &parent, &desired).await.unwrap();
        assert_eq!(
            outcomes
                .iter()
                .map(|o| (o.kind, o.convergence))
                .collect::<Vec<_>>(),
            vec![
                ("Service", Convergence::Created),
                ("StatefulSet", Convergence::Created)
            ]
        );

        let writes = store.journal();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].key.kind, "Service");
        assert_eq!(writes[1].key.kind, "StatefulSet");

        let svc: Service = store.object("ns", &service_name("db1")).unwrap();
        assert!(is_controlled_by(&parent, &svc));
    }

    #[tokio::test]
    async fn second_pass_is_unchanged() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);

        converge_all(&store, &parent, &desired).await.unwrap();
        store.take_journal();

        let outcomes = converge_all(&store, &parent, &desired).await.unwrap();
        assert!(outcomes
            .iter()
            .all(|o| o.convergence == Convergence::Unchanged));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn drifted_child_is_updated() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);
        converge_all(&store, &parent, &desired).await.unwrap();

        let mut live: StatefulSet = store
            .object("ns", &stateful_set_name("db1"))
            .unwrap();
        live.spec.as_mut().unwrap().replicas = Some(1);
        store.update(&live).await.unwrap();

        let outcome = Child::StatefulSet
            .converge(&store, &parent, &desired)
            .await
            .unwrap();
        assert_eq!(outcome.convergence, Convergence::Updated);

        let live: StatefulSet = store
            .object("ns", &stateful_set_name("db1"))
            .unwrap();
        assert_eq!(live.spec.unwrap().replicas, Some(3));
    }

    #[tokio::test]
    async fn failed_create_stops_later_children() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);
        store.fail_next::<Service>(Verb::Create, "apiserver unavailable");

        let err = converge_all(&store, &parent, &desired).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(store.journal().is_empty());
        assert!(store
            .object::<StatefulSet>("ns", &stateful_set_name("db1"))
            .is_none());
    }

    #[tokio::test]
    async fn unpersisted_parent_cannot_create() {
        let store = MemoryStore::new();
        let mut parent = MongoDB::new("db1", MongoDBSpec::default());
        parent.metadata.namespace = Some("ns".into());
        let desired = generator::generate(&parent);

        let err = converge_all(&store, &parent, &desired).await.unwrap_err();
        assert!(matches!(err, Error::OwnerReference { .. }));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn unowned_child_is_adopted_once() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);
        store.insert(desired.service.clone()).unwrap();

        let outcome = Child::Service
            .converge(&store, &parent, &desired)
            .await
            .unwrap();
        assert_eq!(outcome.convergence, Convergence::Updated);
        let svc: Service = store.object("ns", &service_name("db1")).unwrap();
        assert!(is_controlled_by(&parent, &svc));

        let outcome = Child::Service
            .converge(&store, &parent, &desired)
            .await
            .unwrap();
        assert_eq!(outcome.convergence, Convergence::Unchanged);
    }

    #[tokio::test]
    async fn child_of_another_controller_is_not_taken() {
        let store = MemoryStore::new();
        let parent = seeded(&store);
        let desired = generator::generate(&parent);

        let mut other = MongoDB::new("db2", MongoDBSpec::default());
        other.metadata.namespace = Some("ns".into());
        let other = store.insert(other).unwrap();
        let mut svc = desired.service.clone();
        set_controller_reference(&other, &mut svc).unwrap();
        store.insert(svc).unwrap();

        let err = Child::Service
            .converge(&store, &parent, &desired)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OwnerReference { .. }));
        assert!(store.journal().is_empty());
    }

    #[test]
    fn children_converge_service_first() {
        assert_eq!(Child::ALL, [Child::Service, Child::StatefulSet]);
        assert_eq!(Child::StatefulSet.to_string(), "StatefulSet");
    }
}
