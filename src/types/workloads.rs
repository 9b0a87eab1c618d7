use super::{Container, Labels, Selector};
use crate::types::ChildResource;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

#[derive(Clone, Debug)]
pub struct StatefulSet {
    pub name: String,
    pub replicas: i32,
    pub labels: Labels,
    pub selector: Selector,
    pub containers: Vec<Container>,
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
    pub service_name: String,
    pub termination_grace_period_seconds: Option<i64>,
}

impl StatefulSet {
    pub fn new(name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replicas: 1,
            labels: Labels::new(),
            selector: Selector::new(),
            containers: Vec::new(),
            volume_claim_templates: Vec::new(),
            service_name: service_name.into(),
            termination_grace_period_seconds: None,
        }
    }

    pub fn replicas(mut self, n: i32) -> Self {
        self.replicas = n;
        self
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn volume_claim_template(mut self, pvc: PersistentVolumeClaim) -> Self {
        self.volume_claim_templates.push(pvc);
        self
    }

    pub fn termination_grace_period(mut self, seconds: i64) -> Self {
        self.termination_grace_period_seconds = Some(seconds);
        self
    }
}

impl ChildResource for StatefulSet {
    type K8sType = apps::StatefulSet;

    fn into_k8s(self, namespace: &str) -> Self::K8sType {
        let pod_labels = self.selector.as_labels().into_inner();

        apps::StatefulSet {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(namespace.to_string()),
                labels: if self.labels.is_empty() {
                    None
                } else {
                    Some(self.labels.into_inner())
                },
                ..Default::default()
            },
            spec: Some(apps::StatefulSetSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_labels: Some(self.selector.into_inner()),
                    match_expressions: None,
                },
                service_name: self.service_name,
                template: core::PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(pod_labels),
                        ..Default::default()
                    }),
                    spec: Some(core::PodSpec {
                        containers: self.containers.into_iter().map(|c| c.into_k8s()).collect(),
                        termination_grace_period_seconds: self.termination_grace_period_seconds,
                        ..Default::default()
                    }),
                },
                volume_claim_templates: if self.volume_claim_templates.is_empty() {
                    None
                } else {
                    Some(
                        self.volume_claim_templates
                            .into_iter()
                            .map(|p| p.into_k8s_template())
                            .collect(),
                    )
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct PersistentVolumeClaim {
    pub name: String,
    pub access_modes: Vec<String>,
    pub storage: String,
}

impl PersistentVolumeClaim {
    pub fn new(name: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_modes: vec!["ReadWriteOnce".to_string()],
            storage: storage.into(),
        }
    }

    pub fn into_k8s_template(self) -> core::PersistentVolumeClaim {
        core::PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(self.name),
                ..Default::default()
            },
            spec: Some(core::PersistentVolumeClaimSpec {
                access_modes: Some(self.access_modes),
                resources: Some(core::VolumeResourceRequirements {
                    requests: Some(
                        [("storage".to_string(), Quantity(self.storage))]
                            .into_iter()
                            .collect(),
                    ),
                    limits: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
