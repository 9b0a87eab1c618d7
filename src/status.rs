use crate::crd::{MongoDB, MongoDBStatus};
use crate::error::{Error, Result};
use crate::generator::{service_name, stateful_set_name};
use crate::store::{display_key, ResourceStore, StoreObject};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::debug;

async fn read_child<S, K>(store: &S, kind: &'static str, namespace: &str, name: &str) -> Result<K>
where
    S: ResourceStore,
    K: StoreObject,
{
    match store.get::<K>(namespace, name).await {
        Ok(Some(child)) => Ok(child),
        Ok(None) => Err(Error::StatusRead {
            kind,
            name: name.to_string(),
            source: Box::new(Error::NotFound(display_key::<K>(namespace, name))),
        }),
        Err(e) => Err(Error::StatusRead {
            kind,
            name: name.to_string(),
            source: Box::new(e),
        }),
    }
}

pub async fn observe<S: ResourceStore>(store: &S, parent: &MongoDB) -> Result<MongoDBStatus> {
    let namespace = parent.namespace().unwrap_or_default();
    let name = parent.name_any();

    let stateful_set: StatefulSet =
        read_child(store, "StatefulSet", &namespace, &stateful_set_name(&name)).await?;
    let service: Service = read_child(store, "Service", &namespace, &service_name(&name)).await?;

    Ok(MongoDBStatus {
        stateful_set_status: Some(stateful_set.status.unwrap_or_default()),
        cluster_ip: service.spec.and_then(|spec| spec.cluster_ip),
        service_status: Some(service.status.unwrap_or_default()),
    })
}

pub async fn aggregate<S: ResourceStore>(store: &S, parent: &MongoDB) -> Result<MongoDB> {
    let status = observe(store, parent).await?;

    debug!(
        "Writing status for MongoDB {}/{} (clusterIP {:?})",
        parent.namespace().unwrap_or_default(),
        parent.name_any(),
        status.cluster_ip
    );

    let mut updated = parent.clone();
    updated.status = Some(status);
    store.update_status(&updated).await
}
