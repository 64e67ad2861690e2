//! The `ReplicationController` resource.
use std::collections::BTreeMap;

use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};

use crate::{
    config::Config,
    kvp::{self, ValueFormat},
    model::{
        container::{self, Container},
        meta::{self, ObjectMeta},
        pod::PodTemplate,
        pod_spec::{self, PodSpec, RestartPolicy},
    },
};

const RC_KIND: &str = "ReplicationController";
const API_VERSION: &str = "v1";

/// Length of the generated `rc_version` selector token.
const VERSION_TOKEN_LEN: usize = 12;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("resource name cannot be empty"))]
    EmptyName,

    #[snafu(display("replica count must be non-negative, got {replicas}"))]
    NegativeReplicas { replicas: i32 },

    #[snafu(display("image cannot be empty"))]
    EmptyImage,

    #[snafu(display("failed to build controller metadata"))]
    Metadata { source: meta::Error },

    #[snafu(display("failed to build pod template"))]
    Template { source: pod_spec::Error },

    #[snafu(display("failed to build pod container"))]
    TemplateContainer { source: container::Error },

    #[snafu(display("failed to validate selector"))]
    InvalidSelector { source: kvp::Error },

    #[snafu(display("expected a document of kind {RC_KIND:?}, got {kind:?}"))]
    WrongKind { kind: String },

    #[snafu(display("replication controller document is malformed"))]
    InvalidDocument { source: serde_json::Error },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplicationControllerSpec {
    #[serde(default)]
    replicas: i32,

    #[serde(default)]
    selector: BTreeMap<String, String>,

    template: PodTemplate,
}

/// A controller resource owning its own metadata *and* an embedded pod
/// template.
///
/// Label and annotation operations come in two independent families:
/// `add_label`/`get_label`/… touch the controller's own metadata, while
/// `add_pod_label`/`get_pod_label`/… touch the template's metadata. Each
/// family validates its arguments on its own and never disturbs the other
/// subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationController {
    kind: String,
    api_version: String,
    metadata: ObjectMeta,
    spec: ReplicationControllerSpec,
}

impl ReplicationController {
    /// Creates a fresh controller.
    ///
    /// The selector is seeded with the resource name plus a generated
    /// `rc_version` token, and the template labels mirror it so the
    /// controller initially selects exactly the pods it creates. The
    /// template's restart policy is pinned to `Always`, the only policy the
    /// apiserver accepts for controller-managed pods.
    pub fn new(name: impl Into<String>, replicas: i32) -> Result<Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyNameSnafu);
        ensure!(replicas >= 0, NegativeReplicasSnafu { replicas });

        let token = version_token();
        let selector = BTreeMap::from([
            ("name".to_owned(), name.clone()),
            ("rc_version".to_owned(), token.clone()),
        ]);

        let mut template = PodTemplate::new(name.as_str()).context(MetadataSnafu)?;
        template
            .add_label("rc_version", &token)
            .context(MetadataSnafu)?;
        template.spec_mut().set_restart_policy(RestartPolicy::Always);

        Ok(ReplicationController {
            kind: RC_KIND.to_owned(),
            api_version: API_VERSION.to_owned(),
            metadata: ObjectMeta::new(name).context(MetadataSnafu)?,
            spec: ReplicationControllerSpec {
                replicas,
                selector,
                template,
            },
        })
    }

    /// Creates a fresh controller whose template runs a single container
    /// named after the controller.
    pub fn with_image(
        name: impl Into<String>,
        image: impl Into<String>,
        replicas: i32,
    ) -> Result<Self> {
        let name = name.into();
        let mut rc = ReplicationController::new(name.clone(), replicas)?;
        let container =
            Container::with_image(name, image).context(TemplateContainerSnafu)?;
        rc.spec.template.spec_mut().add_container(container);
        Ok(rc)
    }

    /// Creates a controller like [`ReplicationController::with_image`],
    /// applying the front-end configuration: the namespace, and the image
    /// pull secret when one is configured.
    pub fn with_image_from(
        config: &Config,
        name: impl Into<String>,
        image: impl Into<String>,
        replicas: i32,
    ) -> Result<Self> {
        let mut rc = ReplicationController::with_image(name, image, replicas)?;
        rc.set_namespace(config.get_namespace())?;
        if let Some(pull_secret) = config.get_pull_secret() {
            rc.add_image_pull_secrets(pull_secret)?;
        }
        Ok(rc)
    }

    /// Rebuilds the typed view from a raw resource document.
    pub fn from_document(document: Value) -> Result<Self> {
        let rc: ReplicationController =
            serde_json::from_value(document).context(InvalidDocumentSnafu)?;
        ensure!(rc.kind == RC_KIND, WrongKindSnafu { kind: rc.kind });
        Ok(rc)
    }

    /// The serializable document, the sole wire artifact sent to the
    /// apiserver.
    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context(InvalidDocumentSnafu)
    }

    pub fn get_name(&self) -> &str {
        self.metadata.get_name()
    }

    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> Result<&mut Self> {
        self.metadata
            .set_namespace(namespace)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn get_namespace(&self) -> &str {
        self.metadata.get_namespace()
    }

    pub fn pod_template(&self) -> &PodTemplate {
        &self.spec.template
    }

    pub fn pod_template_mut(&mut self) -> &mut PodTemplate {
        &mut self.spec.template
    }

    pub fn set_replicas(&mut self, replicas: i32) -> Result<&mut Self> {
        ensure!(replicas >= 0, NegativeReplicasSnafu { replicas });

        self.spec.replicas = replicas;
        Ok(self)
    }

    pub fn get_replicas(&self) -> i32 {
        self.spec.replicas
    }

    /// Replaces `spec.selector`.
    ///
    /// The selector is seeded once at construction and never recomputed;
    /// keeping it consistent with the template labels is the caller's
    /// responsibility. A controller whose selector does not match its
    /// template creates pods it immediately stops managing.
    pub fn set_selector(&mut self, selector: BTreeMap<String, String>) -> Result<&mut Self> {
        for (key, value) in &selector {
            kvp::validate_key(key).context(InvalidSelectorSnafu)?;
            kvp::validate_label_value(value).context(InvalidSelectorSnafu)?;
        }

        self.spec.selector = selector;
        Ok(self)
    }

    pub fn get_selector(&self) -> &BTreeMap<String, String> {
        &self.spec.selector
    }

    // ------------------------------------------------------------------
    // Controller metadata family
    // ------------------------------------------------------------------

    pub fn add_label(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.metadata.add_label(key, value).context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_label(&mut self, key: &str) -> &mut Self {
        self.metadata.del_label(key);
        self
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.metadata.get_label(key)
    }

    pub fn get_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.get_labels()
    }

    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) -> Result<&mut Self> {
        self.metadata.set_labels(labels).context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn add_annotation(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.metadata
            .add_annotation(key, value)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_annotation(&mut self, key: &str) -> &mut Self {
        self.metadata.del_annotation(key);
        self
    }

    pub fn get_annotation(&self, key: &str) -> Option<&str> {
        self.metadata.get_annotation(key)
    }

    pub fn get_annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.get_annotations()
    }

    pub fn set_annotations(&mut self, annotations: BTreeMap<String, String>) -> Result<&mut Self> {
        self.metadata
            .set_annotations(annotations)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Pod template metadata family
    // ------------------------------------------------------------------

    pub fn add_pod_label(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.spec.template.add_label(key, value).context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_pod_label(&mut self, key: &str) -> &mut Self {
        self.spec.template.del_label(key);
        self
    }

    pub fn get_pod_label(&self, key: &str) -> Option<&str> {
        self.spec.template.get_label(key)
    }

    pub fn get_pod_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.template.get_labels()
    }

    pub fn set_pod_labels(&mut self, labels: BTreeMap<String, String>) -> Result<&mut Self> {
        self.spec.template.set_labels(labels).context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn add_pod_annotation(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.spec
            .template
            .add_annotation(key, value)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_pod_annotation(&mut self, key: &str) -> &mut Self {
        self.spec.template.del_annotation(key);
        self
    }

    pub fn get_pod_annotation(&self, key: &str) -> Option<&str> {
        self.spec.template.get_annotation(key)
    }

    pub fn get_pod_annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.template.get_annotations()
    }

    pub fn set_pod_annotations(
        &mut self,
        annotations: BTreeMap<String, String>,
    ) -> Result<&mut Self> {
        self.spec
            .template
            .set_annotations(annotations)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Pod template spec passthrough
    // ------------------------------------------------------------------

    pub fn add_container(&mut self, container: Container) -> &mut Self {
        self.spec.template.spec_mut().add_container(container);
        self
    }

    pub fn set_pod_image(
        &mut self,
        name: impl AsRef<str>,
        image: impl Into<String>,
    ) -> Result<&mut Self> {
        self.spec
            .template
            .spec_mut()
            .set_image(name, image)
            .context(TemplateSnafu)?;
        Ok(self)
    }

    pub fn add_image_pull_secrets(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.spec
            .template
            .spec_mut()
            .add_image_pull_secrets(name)
            .context(TemplateSnafu)?;
        Ok(self)
    }

    pub fn pod_spec(&self) -> &PodSpec {
        self.spec.template.spec()
    }

    // ------------------------------------------------------------------
    // Front-end preconditions
    // ------------------------------------------------------------------
    //
    // The network halves of get-by-name, resize and rolling-update live in
    // front-end clients. Their argument checks are pure and belong here so
    // a violation fails before any request is attempted.

    pub fn validate_get_by_name(_config: &Config, name: &str) -> Result<()> {
        ensure!(!name.is_empty(), EmptyNameSnafu);
        Ok(())
    }

    pub fn validate_resize(config: &Config, name: &str, replicas: i32) -> Result<()> {
        Self::validate_get_by_name(config, name)?;
        ensure!(replicas >= 0, NegativeReplicasSnafu { replicas });
        Ok(())
    }

    pub fn validate_rolling_update(
        config: &Config,
        name: &str,
        target: RollingUpdateTarget<'_>,
    ) -> Result<()> {
        Self::validate_get_by_name(config, name)?;
        match target {
            RollingUpdateTarget::Image(image) => ensure!(!image.is_empty(), EmptyImageSnafu),
            // a replacement model is valid by construction
            RollingUpdateTarget::Model(_) => {}
        }
        Ok(())
    }
}

/// What a rolling update rolls out: a new image for the existing template,
/// or a full replacement controller model.
#[derive(Clone, Copy, Debug)]
pub enum RollingUpdateTarget<'a> {
    Image(&'a str),
    Model(&'a ReplicationController),
}

fn version_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(VERSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
