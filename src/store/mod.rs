mod cluster;
mod memory;

pub use cluster::KubeStore;
pub use memory::{MemoryStore, ObjectKey, Verb, Write};

use crate::error::Result;
use kube::core::NamespaceResourceScope;
use kube::Resource;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> StoreObject for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    async fn create<K: StoreObject>(&self, object: &K) -> Result<K>;

    /// Replaces the object's spec and metadata. Status is left as stored.
    async fn update<K: StoreObject>(&self, object: &K) -> Result<K>;

    /// Writes only the status block through the status subresource.
    async fn update_status<K: StoreObject>(&self, object: &K) -> Result<K>;
}

pub(crate) fn display_key<K: StoreObject>(namespace: &str, name: &str) -> String {
    format!("{} {}/{}", K::kind(&()), namespace, name)
}
