use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_COMPONENT: &str = "mongodb-operator";

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub namespace: Option<String>,
    pub error_requeue: Duration,
    pub component: String,
    pub instance: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            error_requeue: Duration::from_secs(60),
            component: DEFAULT_COMPONENT.to_string(),
            instance: "operator".to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn error_requeue(mut self, duration: Duration) -> Self {
        self.error_requeue = duration;
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(val) = lookup("WATCH_NAMESPACE").filter(|v| !v.is_empty()) {
            config.namespace = Some(val);
        }

        if let Some(val) = lookup("ERROR_REQUEUE_SECS") {
            let secs: u64 = val.parse().map_err(|_| {
                Error::InvalidConfig(format!("Invalid ERROR_REQUEUE_SECS: {}", val))
            })?;
            config.error_requeue = Duration::from_secs(secs);
        }

        if let Some(val) = lookup("REPORTING_COMPONENT") {
            config.component = val;
        }

        if let Some(val) = lookup("POD_NAME") {
            config.instance = val;
        }

        Ok(config)
    }
}
