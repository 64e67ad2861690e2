//! The configuration handle consumed by front-end clients.
//!
//! The model layer never performs network I/O itself; it only receives a
//! [`Config`] so that argument preconditions can be checked before a
//! front-end attempts a request. A `Config` is valid by construction, which
//! is all the "valid configuration handle" precondition requires.
use snafu::{ensure, Snafu};

const DEFAULT_API_HOST: &str = "localhost:8888";
const DEFAULT_NAMESPACE: &str = "default";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("api host cannot be empty"))]
    EmptyApiHost,

    #[snafu(display("namespace cannot be empty"))]
    EmptyNamespace,
}

/// Connection settings for a remote apiserver.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    api_host: String,
    namespace: String,
    pull_secret: Option<String>,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_host: DEFAULT_API_HOST.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            pull_secret: None,
            token: None,
        }
    }
}

impl Config {
    pub fn new(api_host: impl Into<String>) -> Result<Self> {
        let api_host = api_host.into();
        ensure!(!api_host.is_empty(), EmptyApiHostSnafu);

        Ok(Config {
            api_host,
            ..Config::default()
        })
    }

    pub fn namespace(&mut self, namespace: impl Into<String>) -> Result<&mut Self> {
        let namespace = namespace.into();
        ensure!(!namespace.is_empty(), EmptyNamespaceSnafu);

        self.namespace = namespace;
        Ok(self)
    }

    /// The image pull secret front-ends attach to freshly built pod specs.
    pub fn pull_secret(&mut self, pull_secret: impl Into<String>) -> &mut Self {
        self.pull_secret = Some(pull_secret.into());
        self
    }

    pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    pub fn get_api_host(&self) -> &str {
        &self.api_host
    }

    pub fn get_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get_pull_secret(&self) -> Option<&str> {
        self.pull_secret.as_deref()
    }

    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.get_api_host(), "localhost:8888");
        assert_eq!(config.get_namespace(), "default");
        assert_eq!(config.get_pull_secret(), None);
    }

    #[test]
    fn empty_api_host_is_rejected() {
        assert_eq!(Config::new("").unwrap_err(), Error::EmptyApiHost);
    }

    #[test]
    fn pull_secret_round_trip() {
        let mut config = Config::new("k8s.example.com:6443").unwrap();
        config.namespace("staging").unwrap().pull_secret("regcred");

        assert_eq!(config.get_namespace(), "staging");
        assert_eq!(config.get_pull_secret(), Some("regcred"));
    }
}
