//! Typed views over apiserver resource documents.
//!
//! Each resource is a plain typed struct that is the single source of truth;
//! the untyped wire document is produced on demand by `to_document()` and
//! recovered by `from_document()`. Because there is no cached raw document,
//! a typed accessor and the serialized form can never disagree.
pub mod container;
pub mod meta;
pub mod pod;
pub mod pod_spec;
pub mod replication_controller;

pub use container::{Container, ContainerPort, EnvVar, ResourceRequirements, VolumeMount};
pub use meta::ObjectMeta;
pub use pod::{Pod, PodTemplate};
pub use pod_spec::{
    DnsPolicy, EmptyDirVolumeSource, HostPathVolumeSource, LocalObjectReference, PodSpec,
    RestartPolicy, Volume,
};
pub use replication_controller::{ReplicationController, RollingUpdateTarget};
