use super::{Labels, Selector};
use crate::types::ChildResource;
use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

#[derive(Clone, Debug)]
pub struct Service {
    pub name: String,
    pub labels: Labels,
    pub selector: Selector,
    pub ports: Vec<ServicePort>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            selector: Selector::new(),
            ports: Vec::new(),
        }
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn tcp_port(mut self, port: i32, target_port: i32) -> Self {
        self.ports.push(ServicePort { port, target_port });
        self
    }
}

impl ChildResource for Service {
    type K8sType = k8s::Service;

    fn into_k8s(self, namespace: &str) -> Self::K8sType {
        k8s::Service {
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
            spec: Some(k8s::ServiceSpec {
                selector: Some(self.selector.into_inner()),
                ports: if self.ports.is_empty() {
                    None
                } else {
                    Some(self.ports.into_iter().map(|p| p.into_k8s()).collect())
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ServicePort {
    pub port: i32,
    pub target_port: i32,
}

impl ServicePort {
    /// Protocol is spelled out because the API server defaults it to TCP and
    /// the port list is compared verbatim against the live object.
    pub fn into_k8s(self) -> k8s::ServicePort {
        k8s::ServicePort {
            port: self.port,
            target_port: Some(IntOrString::Int(self.target_port)),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }
    }
}
