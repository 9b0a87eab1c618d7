use crate::error::{Error, Result};
use k8s_openapi::api::apps::v1::StatefulSetStatus;
use k8s_openapi::api::core::v1::ServiceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPLICAS: i32 = 1;
pub const DEFAULT_STORAGE: &str = "100Gi";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "databases.example.com",
    version = "v1alpha1",
    kind = "MongoDB",
    plural = "mongodbs",
    namespaced,
    derive = "PartialEq",
    status = "MongoDBStatus",
    scale = r#"{"specReplicasPath":".spec.replicas", "statusReplicasPath":".status.statefulSetStatus.replicas"}"#,
    printcolumn = r#"{"name":"storage", "type":"string", "format":"byte", "jsonPath":".spec.storage"}"#,
    printcolumn = r#"{"name":"replicas", "type":"integer", "format":"int32", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"ready replicas", "type":"integer", "format":"int32", "jsonPath":".status.statefulSetStatus.readyReplicas"}"#,
    printcolumn = r#"{"name":"current replicas", "type":"integer", "format":"int32", "jsonPath":".status.statefulSetStatus.currentReplicas"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub replicas: Option<i32>,

    /// Size of each member's data volume, e.g. `100Gi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stateful_set_status: Option<StatefulSetStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_status: Option<ServiceStatus>,

    #[serde(default, rename = "clusterIP", skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
}

impl MongoDBSpec {
    pub fn new(replicas: i32, storage: impl Into<String>) -> Self {
        Self {
            replicas: Some(replicas),
            storage: Some(storage.into()),
        }
    }

    pub fn replicas_or_default(&self) -> i32 {
        self.replicas.unwrap_or(DEFAULT_REPLICAS)
    }

    pub fn storage_or_default(&self) -> &str {
        self.storage.as_deref().unwrap_or(DEFAULT_STORAGE)
    }

    /// Fills unset fields in place. The result lives only for the current
    /// pass; nothing writes the spec back.
    pub fn fill_defaults(&mut self) {
        self.replicas.get_or_insert(DEFAULT_REPLICAS);
        if self.storage.is_none() {
            self.storage = Some(DEFAULT_STORAGE.to_string());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(replicas) = self.replicas {
            if replicas < 1 {
                return Err(Error::InvalidSpec(format!(
                    "replicas must be at least 1, got {}",
                    replicas
                )));
            }
        }

        if let Some(ref storage) = self.storage {
            if !is_quantity(storage) {
                return Err(Error::InvalidSpec(format!(
                    "storage {:?} is not a valid quantity",
                    storage
                )));
            }
        }

        Ok(())
    }
}

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: [&str; 7] = ["m", "k", "M", "G", "T", "P", "E"];

pub fn is_quantity(value: &str) -> bool {
    let value = value.strip_prefix('+').unwrap_or(value);
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(split);

    if !is_decimal(number) {
        return false;
    }

    if suffix.is_empty()
        || BINARY_SUFFIXES.contains(&suffix)
        || DECIMAL_SUFFIXES.contains(&suffix)
    {
        return true;
    }

    match suffix.strip_prefix(['e', 'E']) {
        Some(exponent) => {
            let digits = exponent
                .strip_prefix(['+', '-'])
                .unwrap_or(exponent);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn is_decimal(number: &str) -> bool {
    let mut parts = number.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let whole_ok = whole.chars().all(|c| c.is_ascii_digit());
    let fraction_ok = fraction.map_or(true, |f| f.chars().all(|c| c.is_ascii_digit()));
    let has_digits = !whole.is_empty() || fraction.is_some_and(|f| !f.is_empty());

    whole_ok && fraction_ok && has_digits
}
