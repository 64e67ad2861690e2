//! The pod template pair and the standalone `Pod` resource.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};

use crate::{
    config::Config,
    model::{
        container::{self, Container},
        meta::{self, ObjectMeta},
        pod_spec::{self, PodSpec},
    },
};

const POD_KIND: &str = "Pod";
const API_VERSION: &str = "v1";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build pod metadata"))]
    Metadata { source: meta::Error },

    #[snafu(display("failed to build pod container"))]
    Container { source: container::Error },

    #[snafu(display("failed to build pod spec"))]
    Spec { source: pod_spec::Error },

    #[snafu(display("expected a document of kind {POD_KIND:?}, got {kind:?}"))]
    WrongKind { kind: String },

    #[snafu(display("pod document is malformed"))]
    InvalidDocument { source: serde_json::Error },
}

/// The embedded `{metadata, spec}` pair describing pods a controller creates.
///
/// Both the standalone [`Pod`] and controller specs' `template` field are
/// built from this pair. Label and annotation operations are passed through
/// to the metadata block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    metadata: ObjectMeta,
    spec: PodSpec,
}

impl PodTemplate {
    pub fn new(name: impl Into<String>) -> Result<Self, meta::Error> {
        Ok(PodTemplate {
            metadata: ObjectMeta::new(name)?,
            spec: PodSpec::new(),
        })
    }

    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    pub fn spec(&self) -> &PodSpec {
        &self.spec
    }

    pub fn spec_mut(&mut self) -> &mut PodSpec {
        &mut self.spec
    }

    pub fn add_label(&mut self, key: &str, value: &str) -> Result<&mut Self, meta::Error> {
        self.metadata.add_label(key, value)?;
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

    pub fn set_labels(
        &mut self,
        labels: BTreeMap<String, String>,
    ) -> Result<&mut Self, meta::Error> {
        self.metadata.set_labels(labels)?;
        Ok(self)
    }

    pub fn add_annotation(&mut self, key: &str, value: &str) -> Result<&mut Self, meta::Error> {
        self.metadata.add_annotation(key, value)?;
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

    pub fn set_annotations(
        &mut self,
        annotations: BTreeMap<String, String>,
    ) -> Result<&mut Self, meta::Error> {
        self.metadata.set_annotations(annotations)?;
        Ok(self)
    }
}

/// A standalone pod resource: the `{kind, apiVersion}` envelope around a
/// [`PodTemplate`], plus an optional status fragment.
///
/// The status block is only ever produced by the apiserver. It is kept as an
/// opaque document on load so front-ends can read phase and conditions from
/// it, and is serialized back verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    kind: String,
    api_version: String,

    #[serde(flatten)]
    template: PodTemplate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Value>,
}

impl Pod {
    /// Creates an empty pod with the given name, in the `default` namespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Pod {
            kind: POD_KIND.to_owned(),
            api_version: API_VERSION.to_owned(),
            template: PodTemplate::new(name).context(MetadataSnafu)?,
            status: None,
        })
    }

    /// Creates a pod running a single container named after the pod.
    pub fn with_image(name: impl Into<String>, image: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut pod = Pod::new(name.clone())?;
        let container = Container::with_image(name, image).context(ContainerSnafu)?;
        pod.template.spec_mut().add_container(container);
        Ok(pod)
    }

    /// Creates a pod like [`Pod::with_image`], applying the front-end
    /// configuration: the namespace, and the image pull secret when one is
    /// configured.
    pub fn with_image_from(
        config: &Config,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self> {
        let mut pod = Pod::with_image(name, image)?;
        pod.metadata_mut()
            .set_namespace(config.get_namespace())
            .context(MetadataSnafu)?;
        if let Some(pull_secret) = config.get_pull_secret() {
            pod.spec_mut()
                .add_image_pull_secrets(pull_secret)
                .context(SpecSnafu)?;
        }
        Ok(pod)
    }

    /// Rebuilds the typed view from a raw resource document, keeping any
    /// `status` block as an opaque fragment.
    pub fn from_document(document: Value) -> Result<Self> {
        let pod: Pod = serde_json::from_value(document).context(InvalidDocumentSnafu)?;
        ensure!(pod.kind == POD_KIND, WrongKindSnafu { kind: pod.kind });
        Ok(pod)
    }

    /// The serializable document, the sole wire artifact sent to the
    /// apiserver.
    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context(InvalidDocumentSnafu)
    }

    pub fn metadata(&self) -> &ObjectMeta {
        self.template.metadata()
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        self.template.metadata_mut()
    }

    pub fn spec(&self) -> &PodSpec {
        self.template.spec()
    }

    pub fn spec_mut(&mut self) -> &mut PodSpec {
        self.template.spec_mut()
    }

    pub fn get_name(&self) -> &str {
        self.template.metadata().get_name()
    }

    pub fn get_status(&self) -> Option<&Value> {
        self.status.as_ref()
    }

    pub fn add_label(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.template.add_label(key, value).context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_label(&mut self, key: &str) -> &mut Self {
        self.template.del_label(key);
        self
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.template.get_label(key)
    }

    pub fn add_annotation(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.template
            .add_annotation(key, value)
            .context(MetadataSnafu)?;
        Ok(self)
    }

    pub fn del_annotation(&mut self, key: &str) -> &mut Self {
        self.template.del_annotation(key);
        self
    }

    pub fn get_annotation(&self, key: &str) -> Option<&str> {
        self.template.get_annotation(key)
    }
}
