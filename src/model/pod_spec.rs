//! The `spec` block describing how a pod runs.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};
use tracing::warn;

use crate::{
    kvp::{self, ValueFormat},
    model::container::{self, Container},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("volume name cannot be empty"))]
    EmptyVolumeName,

    #[snafu(display("host volume {name:?} needs a non-empty host path"))]
    EmptyVolumePath { name: String },

    #[snafu(display("image pull secret name cannot be empty"))]
    EmptyPullSecretName,

    #[snafu(display("node name cannot be empty"))]
    EmptyNodeName,

    #[snafu(display("service account name cannot be empty"))]
    EmptyServiceAccountName,

    #[snafu(display("active deadline must be non-negative, got {seconds}"))]
    NegativeActiveDeadline { seconds: i64 },

    #[snafu(display("termination grace period must be strictly positive, got {seconds}"))]
    NonPositiveGracePeriod { seconds: i64 },

    #[snafu(display("{policy:?} is not a valid dns policy"))]
    UnknownDnsPolicy {
        source: strum::ParseError,
        policy: String,
    },

    #[snafu(display("{policy:?} is not a valid restart policy"))]
    UnknownRestartPolicy {
        source: strum::ParseError,
        policy: String,
    },

    #[snafu(display("failed to validate node selector"))]
    InvalidNodeSelector { source: kvp::Error },

    #[snafu(display("failed to update container"))]
    InvalidContainer { source: container::Error },

    #[snafu(display("pod spec document is malformed"))]
    InvalidDocument { source: serde_json::Error },
}

/// How DNS queries of the pod's containers are resolved.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum DnsPolicy {
    Default,
    ClusterFirst,
}

impl DnsPolicy {
    /// Parses raw input, e.g. from a loaded document or user configuration.
    pub fn parse(policy: &str) -> Result<Self> {
        policy
            .parse()
            .context(UnknownDnsPolicySnafu { policy })
    }
}

/// Whether containers are restarted after they terminate.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
}

impl RestartPolicy {
    pub fn parse(policy: &str) -> Result<Self> {
        policy
            .parse()
            .context(UnknownRestartPolicySnafu { policy })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyDirVolumeSource {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
}

/// A by-name reference to another object in the same namespace, e.g. an
/// image pull secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    pub name: String,
}

/// A typed view over a pod's `spec` block.
///
/// Owns the ordered container list. `volumes` is structurally required by
/// the apiserver schema, so it is always serialized and backfilled with an
/// empty list when loading a document that lacks it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,

    #[serde(default)]
    volumes: Vec<Volume>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dns_policy: Option<DnsPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    restart_policy: Option<RestartPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    node_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    node_selector: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_deadline_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    termination_grace_period_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_pull_secrets: Option<Vec<LocalObjectReference>>,
}

impl Default for PodSpec {
    fn default() -> Self {
        PodSpec {
            containers: Vec::new(),
            volumes: Vec::new(),
            dns_policy: Some(DnsPolicy::Default),
            restart_policy: None,
            node_name: None,
            node_selector: None,
            service_account_name: None,
            active_deadline_seconds: None,
            termination_grace_period_seconds: None,
            image_pull_secrets: None,
        }
    }
}

impl PodSpec {
    pub fn new() -> Self {
        PodSpec::default()
    }

    /// Creates a fresh spec with an image pull secret already referenced,
    /// the way front-ends thread their configured secret into every pod
    /// spec they build.
    pub fn with_pull_secret(pull_secret: impl Into<String>) -> Result<Self> {
        let mut spec = PodSpec::new();
        spec.add_image_pull_secrets(pull_secret)?;
        Ok(spec)
    }

    /// Rebuilds the typed view from a raw `spec` document. A missing
    /// `volumes` list is backfilled as empty.
    pub fn from_document(document: Value) -> Result<Self> {
        serde_json::from_value(document).context(InvalidDocumentSnafu)
    }

    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context(InvalidDocumentSnafu)
    }

    pub fn add_container(&mut self, container: Container) -> &mut Self {
        self.containers.push(container);
        self
    }

    pub fn get_containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn add_host_volume(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.into();
        let path = path.into();
        ensure!(!name.is_empty(), EmptyVolumeNameSnafu);
        ensure!(!path.is_empty(), EmptyVolumePathSnafu { name });

        self.volumes.push(Volume {
            name,
            host_path: Some(HostPathVolumeSource { path }),
            empty_dir: None,
        });
        Ok(self)
    }

    pub fn add_emptydir_volume(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyVolumeNameSnafu);

        self.volumes.push(Volume {
            name,
            host_path: None,
            empty_dir: Some(EmptyDirVolumeSource::default()),
        });
        Ok(self)
    }

    pub fn get_volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// Appends a pull secret reference, lazily creating the list.
    pub fn add_image_pull_secrets(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyPullSecretNameSnafu);

        self.image_pull_secrets
            .get_or_insert_with(Vec::new)
            .push(LocalObjectReference { name });
        Ok(self)
    }

    pub fn get_image_pull_secrets(&self) -> Option<&[LocalObjectReference]> {
        self.image_pull_secrets.as_deref()
    }

    pub fn set_dns_policy(&mut self, policy: DnsPolicy) -> &mut Self {
        self.dns_policy = Some(policy);
        self
    }

    pub fn get_dns_policy(&self) -> Option<DnsPolicy> {
        self.dns_policy
    }

    pub fn set_restart_policy(&mut self, policy: RestartPolicy) -> &mut Self {
        self.restart_policy = Some(policy);
        self
    }

    pub fn get_restart_policy(&self) -> Option<RestartPolicy> {
        self.restart_policy
    }

    pub fn set_active_deadline(&mut self, seconds: i64) -> Result<&mut Self> {
        ensure!(seconds >= 0, NegativeActiveDeadlineSnafu { seconds });

        self.active_deadline_seconds = Some(seconds);
        Ok(self)
    }

    pub fn get_active_deadline(&self) -> Option<i64> {
        self.active_deadline_seconds
    }

    pub fn set_termination_grace_period(&mut self, seconds: i64) -> Result<&mut Self> {
        ensure!(seconds > 0, NonPositiveGracePeriodSnafu { seconds });

        self.termination_grace_period_seconds = Some(seconds);
        Ok(self)
    }

    pub fn get_termination_grace_period(&self) -> Option<i64> {
        self.termination_grace_period_seconds
    }

    /// Replaces the image of the first container whose name matches.
    ///
    /// An unmatched name leaves the spec untouched; this mirrors the probing
    /// usage of front-end callers and is therefore not an error, but it is
    /// logged.
    pub fn set_image(
        &mut self,
        name: impl AsRef<str>,
        image: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.as_ref();
        match self
            .containers
            .iter_mut()
            .find(|container| container.get_name() == name)
        {
            Some(container) => {
                container.set_image(image).context(InvalidContainerSnafu)?;
            }
            None => warn!(container.name = name, "no container with this name, image unchanged"),
        }
        Ok(self)
    }

    pub fn set_node_selector(&mut self, selector: BTreeMap<String, String>) -> Result<&mut Self> {
        kvp::replace(&mut self.node_selector, selector, ValueFormat::Label)
            .context(InvalidNodeSelectorSnafu)?;
        Ok(self)
    }

    pub fn get_node_selector(&self) -> Option<&BTreeMap<String, String>> {
        self.node_selector.as_ref()
    }

    pub fn set_node_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyNodeNameSnafu);

        self.node_name = Some(name);
        Ok(self)
    }

    pub fn del_node_name(&mut self) -> &mut Self {
        self.node_name = None;
        self
    }

    pub fn get_node_name(&self) -> Option<&str> {
        self.node_name.as_deref()
    }

    pub fn set_service_account(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyServiceAccountNameSnafu);

        self.service_account_name = Some(name);
        Ok(self)
    }

    pub fn get_service_account(&self) -> Option<&str> {
        self.service_account_name.as_deref()
    }
}
