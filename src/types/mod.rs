pub mod container;
pub mod core;
pub mod metadata;
pub mod workloads;

pub use self::container::*;
pub use self::core::*;
pub use self::metadata::*;
pub use self::workloads::*;

pub trait ChildResource: Send + Sync {
    type K8sType: kube::Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>;

    fn into_k8s(self, namespace: &str) -> Self::K8sType;
}
