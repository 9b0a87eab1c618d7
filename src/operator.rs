use crate::config::ControllerConfig;
use crate::context::Context;
use crate::crd::MongoDB;
use crate::error::{Error, Result};
use crate::reconcile::{self, Reconciled};
use crate::store::KubeStore;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct Operator {
    config: ControllerConfig,
}

impl Operator {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    fn api<K>(&self, client: &Client) -> Api<K>
    where
        K: kube::Resource<DynamicType = (), Scope = kube::core::NamespaceResourceScope>,
    {
        match self.config.namespace {
            Some(ref namespace) => Api::namespaced(client.clone(), namespace),
            None => Api::all(client.clone()),
        }
    }

    pub async fn run(self) -> Result<()> {
        let client = Client::try_default().await.map_err(Error::Kube)?;

        info!(
            "Starting operator for MongoDB in {}",
            self.config.namespace.as_deref().unwrap_or("all namespaces")
        );

        let parents: Api<MongoDB> = self.api(&client);
        let services: Api<Service> = self.api(&client);
        let stateful_sets: Api<StatefulSet> = self.api(&client);

        let store = KubeStore::new(client, self.config.component.clone());
        let ctx = Arc::new(Context::new(store, self.config));

        Controller::new(parents, WatcherConfig::default())
            .owns(services, WatcherConfig::default())
            .owns(stateful_sets, WatcherConfig::default())
            .shutdown_on_signal()
            .run(reconcile_wrapper, error_policy, ctx)
            .for_each(|result| async move {
                match result {
                    Ok((resource, action)) => {
                        info!("Reconciled {} - {:?}", resource.name, action);
                    }
                    Err(e) => {
                        error!("Reconciliation error: {:?}", e);
                    }
                }
            })
            .await;

        info!("Operator stopped");
        Ok(())
    }
}

async fn reconcile_wrapper(
    resource: Arc<MongoDB>,
    ctx: Arc<Context<KubeStore>>,
) -> std::result::Result<Action, Error> {
    let namespace = resource.namespace().ok_or(Error::MissingField("metadata.namespace"))?;
    let name = resource.name_any();

    match reconcile::reconcile(ctx.as_ref(), &namespace, &name).await? {
        Reconciled::Missing | Reconciled::Deleting => {}
        Reconciled::Converged { children, .. } => {
            debug!("MongoDB {}/{} children: {:?}", namespace, name, children);
        }
    }

    Ok(Action::await_change())
}

fn error_policy(resource: Arc<MongoDB>, error: &Error, ctx: Arc<Context<KubeStore>>) -> Action {
    let name = resource.name_any();
    if error.is_conflict() {
        debug!("Conflict reconciling {}, retrying: {}", name, error);
    } else {
        error!("Error reconciling {}: {:?}", name, error);
    }
    Action::requeue(ctx.config().error_requeue)
}
