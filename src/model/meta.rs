//! The `metadata` block shared by every resource.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};

use crate::kvp::{self, ValueFormat};

const DEFAULT_NAMESPACE: &str = "default";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("resource name cannot be empty"))]
    EmptyName,

    #[snafu(display("resource name {name:?} is not usable as a label value"))]
    InvalidName { source: kvp::Error, name: String },

    #[snafu(display("namespace cannot be empty"))]
    EmptyNamespace,

    #[snafu(display("failed to validate label"))]
    InvalidLabel { source: kvp::Error },

    #[snafu(display("failed to validate annotation"))]
    InvalidAnnotation { source: kvp::Error },

    #[snafu(display("metadata document is malformed"))]
    InvalidDocument { source: serde_json::Error },
}

/// A typed view over a resource's `metadata` block.
///
/// Fresh construction seeds the labels with a `name` label derived from the
/// resource name; [`ObjectMeta::set_name`] keeps that label in step.
/// Annotations stay absent until the first write, so serialized documents
/// only carry an `annotations` key once one was actually added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    name: String,

    #[serde(default = "default_namespace")]
    namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotations: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_version: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

impl ObjectMeta {
    /// Creates metadata for a fresh resource in the `default` namespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyNameSnafu);
        kvp::validate_label_value(&name).context(InvalidNameSnafu { name: name.as_str() })?;

        let labels = BTreeMap::from([("name".to_owned(), name.clone())]);

        Ok(ObjectMeta {
            name,
            namespace: default_namespace(),
            labels: Some(labels),
            annotations: None,
            resource_version: None,
        })
    }

    /// Rebuilds the typed view from a raw `metadata` document. Absent
    /// `labels`/`annotations` are tolerated and stay absent.
    pub fn from_document(document: Value) -> Result<Self> {
        let meta: ObjectMeta = serde_json::from_value(document).context(InvalidDocumentSnafu)?;
        ensure!(!meta.name.is_empty(), EmptyNameSnafu);
        Ok(meta)
    }

    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context(InvalidDocumentSnafu)
    }

    /// Renames the resource and reseeds the `name` label.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyNameSnafu);
        kvp::validate_label_value(&name).context(InvalidNameSnafu { name: name.as_str() })?;

        kvp::insert(&mut self.labels, "name", &name, ValueFormat::Label)
            .context(InvalidLabelSnafu)?;
        self.name = name;
        Ok(self)
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> Result<&mut Self> {
        let namespace = namespace.into();
        ensure!(!namespace.is_empty(), EmptyNamespaceSnafu);

        self.namespace = namespace;
        Ok(self)
    }

    pub fn set_resource_version(&mut self, resource_version: impl Into<String>) -> &mut Self {
        self.resource_version = Some(resource_version.into());
        self
    }

    pub fn add_label(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        kvp::insert(&mut self.labels, key, value, ValueFormat::Label)
            .context(InvalidLabelSnafu)?;
        Ok(self)
    }

    pub fn add_annotation(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        kvp::insert(&mut self.annotations, key, value, ValueFormat::Annotation)
            .context(InvalidAnnotationSnafu)?;
        Ok(self)
    }

    /// Removes a label if present; removing an absent key is a no-op.
    pub fn del_label(&mut self, key: &str) -> &mut Self {
        kvp::remove(&mut self.labels, key);
        self
    }

    pub fn del_annotation(&mut self, key: &str) -> &mut Self {
        kvp::remove(&mut self.annotations, key);
        self
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        kvp::get(&self.labels, key)
    }

    pub fn get_annotation(&self, key: &str) -> Option<&str> {
        kvp::get(&self.annotations, key)
    }

    /// `None` means the collection was never set, as opposed to set but empty.
    pub fn get_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.labels.as_ref()
    }

    pub fn get_annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.annotations.as_ref()
    }

    /// Replaces all labels. Every entry is validated before any is applied.
    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) -> Result<&mut Self> {
        kvp::replace(&mut self.labels, labels, ValueFormat::Label).context(InvalidLabelSnafu)?;
        Ok(self)
    }

    pub fn set_annotations(&mut self, annotations: BTreeMap<String, String>) -> Result<&mut Self> {
        kvp::replace(&mut self.annotations, annotations, ValueFormat::Annotation)
            .context(InvalidAnnotationSnafu)?;
        Ok(self)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get_resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fresh_metadata_seeds_name_label() {
        let meta = ObjectMeta::new("yomama").unwrap();

        assert_eq!(meta.get_name(), "yomama");
        assert_eq!(meta.get_namespace(), "default");
        assert_eq!(meta.get_label("name"), Some("yomama"));
        assert_eq!(meta.get_labels().map(|labels| labels.len()), Some(1));
        assert_eq!(meta.get_annotations(), None);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            ObjectMeta::new("").unwrap_err(),
            Error::EmptyName
        ));
    }

    #[test]
    fn add_label_shows_up_in_document() {
        let mut meta = ObjectMeta::new("web").unwrap();
        meta.add_label("tier", "frontend").unwrap();

        assert_eq!(meta.get_label("tier"), Some("frontend"));
        let document = meta.to_document().unwrap();
        assert_eq!(document["labels"]["tier"], "frontend");
    }

    #[test]
    fn invalid_label_leaves_state_untouched() {
        let mut meta = ObjectMeta::new("web").unwrap();
        meta.add_label("bad key", "x").unwrap_err();

        assert_eq!(meta.get_labels().map(|labels| labels.len()), Some(1));
    }

    #[test]
    fn del_label_of_absent_key_keeps_collection() {
        let mut meta = ObjectMeta::new("web").unwrap();
        meta.del_label("missing");

        assert_eq!(meta.get_label("name"), Some("web"));
        assert!(meta.get_labels().is_some());
    }

    #[test]
    fn annotations_absent_until_first_write() {
        let mut meta = ObjectMeta::new("web").unwrap();
        let document = meta.to_document().unwrap();
        assert!(document.get("annotations").is_none());

        meta.add_annotation("note", "anything goes, even spaces").unwrap();
        let document = meta.to_document().unwrap();
        assert_eq!(document["annotations"]["note"], "anything goes, even spaces");
    }

    #[test]
    fn set_name_reseeds_name_label() {
        let mut meta = ObjectMeta::new("old").unwrap();
        meta.set_name("new").unwrap();

        assert_eq!(meta.get_name(), "new");
        assert_eq!(meta.get_label("name"), Some("new"));
    }

    #[test]
    fn load_without_labels_is_tolerated() {
        let meta = ObjectMeta::from_document(json!({"name": "loaded"})).unwrap();

        assert_eq!(meta.get_name(), "loaded");
        assert_eq!(meta.get_namespace(), "default");
        assert_eq!(meta.get_labels(), None);
    }

    #[test]
    fn round_trip() {
        let mut meta = ObjectMeta::new("web").unwrap();
        meta.set_namespace("prod")
            .unwrap()
            .add_annotation("owner", "team a")
            .unwrap();

        let document = meta.to_document().unwrap();
        let loaded = ObjectMeta::from_document(document.clone()).unwrap();
        assert_eq!(loaded, meta);
        assert_eq!(loaded.to_document().unwrap(), document);
    }
}
