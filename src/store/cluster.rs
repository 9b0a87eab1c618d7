use super::{ResourceStore, StoreObject};
use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api<K: StoreObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }
}

fn identity<K: StoreObject>(object: &K) -> Result<(String, String)> {
    let name = object
        .meta()
        .name
        .clone()
        .ok_or(Error::MissingField("metadata.name"))?;
    let namespace = object
        .meta()
        .namespace
        .clone()
        .ok_or(Error::MissingField("metadata.namespace"))?;
    Ok((namespace, name))
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        match self.api::<K>(namespace).get(name).await {
            Ok(resource) => Ok(Some(resource)),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
            Err(e) => Err(Error::Kube(e)),
        }
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<K> {
        let (namespace, name) = identity(object)?;
        debug!("Creating {} {}/{}", K::kind(&()), namespace, name);

        self.api::<K>(&namespace)
            .create(&self.post_params(), object)
            .await
            .map_err(Error::Kube)
    }

    async fn update<K: StoreObject>(&self, object: &K) -> Result<K> {
        let (namespace, name) = identity(object)?;
        debug!(
            "Replacing {} {}/{} at resourceVersion {:?}",
            K::kind(&()),
            namespace,
            name,
            object.resource_version()
        );

        self.api::<K>(&namespace)
            .replace(&name, &self.post_params(), object)
            .await
            .map_err(Error::Kube)
    }

    async fn update_status<K: StoreObject>(&self, object: &K) -> Result<K> {
        let (namespace, name) = identity(object)?;
        let status = serde_json::to_value(object)?
            .get("status")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        // resourceVersion in a merge patch makes the API server reject stale writes.
        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": object.resource_version(),
            },
            "status": status,
        });
        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        self.api::<K>(&namespace)
            .patch_status(&name, &params, &Patch::Merge(&patch))
            .await
            .map_err(Error::Kube)
    }
}
