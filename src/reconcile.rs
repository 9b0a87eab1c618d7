use crate::context::Context;
use crate::converge::{self, ChildOutcome, Convergence};
use crate::crd::MongoDB;
use crate::error::Result;
use crate::events::reasons;
use crate::generator;
use crate::status;
use crate::store::ResourceStore;
use kube::Resource;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq)]
pub enum Reconciled {
    Missing,
    Deleting,
    Converged {
        children: Vec<ChildOutcome>,
        parent: MongoDB,
    },
}

pub async fn reconcile<S: ResourceStore>(
    ctx: &Context<S>,
    namespace: &str,
    name: &str,
) -> Result<Reconciled> {
    let store = ctx.store();

    let Some(mut parent) = store.get::<MongoDB>(namespace, name).await? else {
        debug!("MongoDB {}/{} not found, nothing to do", namespace, name);
        return Ok(Reconciled::Missing);
    };

    if parent.meta().deletion_timestamp.is_some() {
        debug!("MongoDB {}/{} is being deleted", namespace, name);
        return Ok(Reconciled::Deleting);
    }

    if let Err(e) = parent.spec.validate() {
        // One warning per generation; requeues of the same spec stay quiet.
        if ctx.mark_rejected(&parent) {
            ctx.warning(&parent, reasons::INVALID_SPEC, &e.to_string())
                .await;
        }
        return Err(e);
    }
    ctx.clear_rejected(&parent);

    info!("Reconciling MongoDB {}/{}", namespace, name);

    parent.spec.fill_defaults();
    let desired = generator::generate(&parent);

    let children = converge::converge_all(store, &parent, &desired).await?;
    let parent = status::aggregate(store, &parent).await?;

    for child in &children {
        let reason = match child.convergence {
            Convergence::Created => reasons::CREATED,
            Convergence::Updated => reasons::UPDATED,
            Convergence::Unchanged => continue,
        };
        let message = format!("{} {} {}", reason, child.kind, child.name);
        ctx.event(&parent, reason, &message).await;
    }

    Ok(Reconciled::Converged { children, parent })
}
