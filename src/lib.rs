//! Client-side typed models for Kubernetes resource manifests.
//!
//! This crate builds and mutates the declarative resource descriptors (Pods,
//! ReplicationControllers and their nested blocks) that front-end clients
//! serialize and send to the apiserver. Every mutation is validated against
//! the apiserver's schema rules before it is applied; invalid input fails
//! synchronously and never leaves a model half-mutated.
//!
//! Network transport, authentication and kubeconfig handling are external
//! collaborators. They receive the wire document through `to_document()` and
//! hand raw response documents back through `from_document()`.
//!
//! Models are single-owner: a builder instance is meant to be mutated by
//! exactly one caller at a time, and the crate does no internal locking.
//!
//! ```
//! use k8s_models::model::Pod;
//!
//! let mut pod = Pod::with_image("web", "nginx")?;
//! pod.add_label("tier", "frontend")?;
//!
//! let document = pod.to_document()?;
//! assert_eq!(document["spec"]["containers"][0]["image"], "nginx");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod config;
pub mod kvp;
pub mod model;

pub use config::Config;
pub use model::{Container, ObjectMeta, Pod, PodSpec, ReplicationController};
