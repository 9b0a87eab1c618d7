pub mod config;
pub mod context;
pub mod converge;
pub mod crd;
pub mod error;
pub mod events;
pub mod generator;
pub mod merge;
pub mod operator;
pub mod ownership;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod types;

pub use config::ControllerConfig;
pub use context::Context;
pub use crd::{MongoDB, MongoDBSpec, MongoDBStatus};
pub use error::{Error, Result};
pub use operator::Operator;
pub use reconcile::{reconcile, Reconciled};
pub use store::{KubeStore, MemoryStore, ResourceStore};

pub fn init_tracing() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

pub mod prelude {
    pub use crate::config::ControllerConfig;
    pub use crate::context::Context;
    pub use crate::converge::{Child, ChildOutcome, Convergence};
    pub use crate::crd::{MongoDB, MongoDBSpec, MongoDBStatus};
    pub use crate::error::{Error, Result};
    pub use crate::operator::Operator;
    pub use crate::reconcile::{reconcile, Reconciled};
    pub use crate::store::{KubeStore, MemoryStore, ResourceStore, Verb};

    pub use kube::runtime::controller::Action;
    pub use std::sync::Arc;
}
