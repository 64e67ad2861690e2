//! A single container entry of a pod spec.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("container name cannot be empty"))]
    EmptyName,

    #[snafu(display("container image cannot be empty"))]
    EmptyImage,

    #[snafu(display("port {port} is outside the valid range 1..=65535"))]
    PortOutOfRange { port: i32 },

    #[snafu(display("environment variable name cannot be empty"))]
    EmptyEnvName,

    #[snafu(display("volume mount needs both a name and a mount path"))]
    IncompleteVolumeMount,

    #[snafu(display("container document is malformed"))]
    InvalidDocument { source: serde_json::Error },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub container_port: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

/// Compute resource limits and requests, expressed as raw quantity strings
/// (`"500m"`, `"128Mi"`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, String>>,
}

/// A typed view over one entry of a pod spec's `containers` array.
///
/// Containers are kept in array order by the owning [`PodSpec`]; the order is
/// preserved when serializing. Name uniqueness within a spec is the caller's
/// responsibility.
///
/// [`PodSpec`]: crate::model::pod_spec::PodSpec
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ports: Option<Vec<ContainerPort>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume_mounts: Option<Vec<VolumeMount>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    resources: Option<ResourceRequirements>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyNameSnafu);

        Ok(Container {
            name,
            image: None,
            ports: None,
            env: None,
            volume_mounts: None,
            resources: None,
        })
    }

    pub fn with_image(name: impl Into<String>, image: impl Into<String>) -> Result<Self> {
        let mut container = Container::new(name)?;
        container.set_image(image)?;
        Ok(container)
    }

    pub fn from_document(document: Value) -> Result<Self> {
        let container: Container =
            serde_json::from_value(document).context(InvalidDocumentSnafu)?;
        ensure!(!container.name.is_empty(), EmptyNameSnafu);
        Ok(container)
    }

    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context(InvalidDocumentSnafu)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, image: impl Into<String>) -> Result<&mut Self> {
        let image = image.into();
        ensure!(!image.is_empty(), EmptyImageSnafu);

        self.image = Some(image);
        Ok(self)
    }

    pub fn add_port(&mut self, name: impl Into<String>, port: i32) -> Result<&mut Self> {
        ensure!((1..=65535).contains(&port), PortOutOfRangeSnafu { port });

        self.ports.get_or_insert_with(Vec::new).push(ContainerPort {
            name: Some(name.into()),
            container_port: port,
            host_port: None,
            protocol: None,
        });
        Ok(self)
    }

    pub fn add_env(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyEnvNameSnafu);

        self.env.get_or_insert_with(Vec::new).push(EnvVar {
            name,
            value: Some(value.into()),
        });
        Ok(self)
    }

    pub fn add_volume_mount(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.into();
        let mount_path = path.into();
        ensure!(
            !name.is_empty() && !mount_path.is_empty(),
            IncompleteVolumeMountSnafu
        );

        self.volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name,
                mount_path,
                read_only: None,
            });
        Ok(self)
    }

    pub fn set_resources(&mut self, resources: ResourceRequirements) -> &mut Self {
        self.resources = Some(resources);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn build_container() {
        let mut container = Container::with_image("web", "nginx").unwrap();
        container
            .add_env("MODE", "production")
            .unwrap()
            .add_port("http", 80)
            .unwrap()
            .add_volume_mount("data", "/var/lib/data")
            .unwrap();

        assert_eq!(container.get_name(), "web");
        assert_eq!(container.get_image(), Some("nginx"));

        let document = container.to_document().unwrap();
        assert_eq!(document["name"], "web");
        assert_eq!(document["image"], "nginx");
        assert_eq!(document["ports"][0]["containerPort"], 80);
        assert_eq!(document["env"][0]["name"], "MODE");
        assert_eq!(document["volumeMounts"][0]["mountPath"], "/var/lib/data");
    }

    #[test]
    fn empty_name_and_image_are_rejected() {
        assert!(matches!(Container::new("").unwrap_err(), Error::EmptyName));

        let mut container = Container::new("web").unwrap();
        assert!(matches!(
            container.set_image("").unwrap_err(),
            Error::EmptyImage
        ));
        assert_eq!(container.get_image(), None);
    }

    #[test]
    fn port_range_is_enforced() {
        let mut container = Container::new("web").unwrap();
        assert!(matches!(
            container.add_port("bad", 0).unwrap_err(),
            Error::PortOutOfRange { port: 0 }
        ));
        assert!(matches!(
            container.add_port("bad", 70000).unwrap_err(),
            Error::PortOutOfRange { port: 70000 }
        ));

        let document = container.to_document().unwrap();
        assert!(document.get("ports").is_none());
    }

    #[test]
    fn load_minimal_document() {
        let container = Container::from_document(json!({"name": "sidecar"})).unwrap();
        assert_eq!(container.get_name(), "sidecar");
        assert_eq!(container.get_image(), None);
    }

    #[test]
    fn load_rejects_missing_name() {
        Container::from_document(json!({"image": "nginx"})).unwrap_err();
    }
}
