use crate::crd::MongoDB;
use crate::types::{
    ChildResource, Container, Labels, PersistentVolumeClaim, Selector, Service, StatefulSet,
};
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use kube::ResourceExt;
use std::collections::BTreeMap;

pub const MONGODB_PORT: i32 = 27017;
pub const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 10;

pub const SERVICE_ROLE_LABEL: &str = "mongodb-service";
/// Label on the StatefulSet naming its parent. The spelling matches objects
/// already deployed by earlier releases.
pub const STATEFULSET_ROLE_LABEL: &str = "mongodb-statefuleset";
pub const POD_SELECTOR_LABEL: &str = "statefulset";

pub const GOVERNING_SERVICE_NAME: &str = "mongo";
pub const DATA_VOLUME: &str = "mongo-persistent-storage";
pub const DATA_PATH: &str = "/data/db";

pub const MONGO_CONTAINER: &str = "mongo";
pub const MONGO_IMAGE: &str = "mongo";
pub const SIDECAR_CONTAINER: &str = "mongo-sidecar";
pub const SIDECAR_IMAGE: &str = "cvallance/mongo-k8s-sidecar";
pub const SIDECAR_POD_LABELS: &str = "role=mongo,environment=test";

pub fn service_name(parent: &str) -> String {
    format!("{}-mongodb-service", parent)
}

pub fn stateful_set_name(parent: &str) -> String {
    format!("{}-mongodb-statefulset", parent)
}

#[derive(Clone, Debug)]
pub struct DesiredState {
    pub service: core::Service,
    pub stateful_set: apps::StatefulSet,
}

pub fn generate(parent: &MongoDB) -> DesiredState {
    let name = parent.name_any();
    let namespace = parent.namespace().unwrap_or_default();

    DesiredState {
        service: service(&name, parent.labels()).into_k8s(&namespace),
        stateful_set: stateful_set(
            &name,
            parent.labels(),
            parent.spec.replicas_or_default(),
            parent.spec.storage_or_default(),
        )
        .into_k8s(&namespace),
    }
}

fn pod_selector(parent: &str) -> Selector {
    Selector::new().match_labels(POD_SELECTOR_LABEL, stateful_set_name(parent))
}

fn service(parent: &str, parent_labels: &BTreeMap<String, String>) -> Service {
    Service::new(service_name(parent))
        .labels(Labels::copied_from(parent_labels).insert(SERVICE_ROLE_LABEL, parent))
        .selector(pod_selector(parent))
        .tcp_port(MONGODB_PORT, MONGODB_PORT)
}

fn stateful_set(
    parent: &str,
    parent_labels: &BTreeMap<String, String>,
    replicas: i32,
    storage: &str,
) -> StatefulSet {
    let mongod = Container::new(MONGO_CONTAINER, MONGO_IMAGE)
        .command(vec![
            "mongod",
            "--replSet",
            "rs0",
            "--smallfiles",
            "--noprealloc",
            "--bind_ip_all",
        ])
        .port(MONGODB_PORT)
        .volume_mount(DATA_VOLUME, DATA_PATH);

    // Joins pods matching the label query into the replica set.
    let sidecar = Container::new(SIDECAR_CONTAINER, SIDECAR_IMAGE)
        .env("MONGO_SIDECAR_POD_LABELS", SIDECAR_POD_LABELS);

    StatefulSet::new(stateful_set_name(parent), GOVERNING_SERVICE_NAME)
        .replicas(replicas)
        .labels(Labels::copied_from(parent_labels).insert(STATEFULSET_ROLE_LABEL, parent))
        .selector(pod_selector(parent))
        .termination_grace_period(TERMINATION_GRACE_PERIOD_SECONDS)
        .container(mongod)
        .container(sidecar)
        .volume_claim_template(PersistentVolumeClaim::new(DATA_VOLUME, storage))
}
