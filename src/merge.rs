//! Labels and annotations are compared only over the keys the live object
//! already has; a live key whose desired value differs (an absent desired key
//! reads as the empty string) triggers an update. When an update is written
//! the desired map replaces the live map whole, so keys added by anyone else
//! are dropped at that point. Keys that exist only in the desired map do not
//! trigger an update on their own.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum Merge<K> {
    Unchanged,
    Update(K),
}

impl<K> Merge<K> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Merge::Unchanged)
    }

    pub fn into_update(self) -> Option<K> {
        match self {
            Merge::Unchanged => None,
            Merge::Update(object) => Some(object),
        }
    }
}

fn live_keys_differ(
    desired: Option<&BTreeMap<String, String>>,
    live: Option<&BTreeMap<String, String>>,
) -> bool {
    let Some(live) = live else {
        return false;
    };
    live.iter().any(|(key, value)| {
        desired
            .and_then(|d| d.get(key))
            .map(String::as_str)
            .unwrap_or("")
            != value
    })
}

pub fn merge_metadata(desired: &ObjectMeta, live: &ObjectMeta) -> (bool, ObjectMeta) {
    let differs = live_keys_differ(desired.labels.as_ref(), live.labels.as_ref())
        || live_keys_differ(desired.annotations.as_ref(), live.annotations.as_ref());

    let merged = ObjectMeta {
        labels: desired.labels.clone(),
        annotations: desired.annotations.clone(),
        ..live.clone()
    };
    (differs, merged)
}

pub fn merge_service(desired: &Service, live: &Service) -> Merge<Service> {
    let (metadata_differs, metadata) = merge_metadata(&desired.metadata, &live.metadata);

    let desired_spec = desired.spec.clone().unwrap_or_default();
    let live_spec = live.spec.clone().unwrap_or_default();
    let spec_differs =
        desired_spec.selector != live_spec.selector || desired_spec.ports != live_spec.ports;

    if !metadata_differs && !spec_differs {
        return Merge::Unchanged;
    }

    Merge::Update(Service {
        metadata,
        spec: Some(ServiceSpec {
            selector: desired_spec.selector,
            ports: desired_spec.ports,
            ..live_spec
        }),
        status: live.status.clone(),
    })
}

pub fn merge_stateful_set(desired: &StatefulSet, live: &StatefulSet) -> Merge<StatefulSet> {
    let (metadata_differs, metadata) = merge_metadata(&desired.metadata, &live.metadata);
    let spec_differs = desired.spec != live.spec;

    if !metadata_differs && !spec_differs {
        return Merge::Unchanged;
    }

    Merge::Update(StatefulSet {
        metadata,
        spec: desired.spec.clone(),
        status: live.status.clone(),
    })
}
