//! Validated key/value map fields.
//!
//! Labels, annotations, selectors and node selectors are all string-to-string
//! maps with the same key grammar. The helpers in this module are the single
//! place where those maps are mutated, so every caller gets identical
//! validation. A map field is `Option<BTreeMap<String, String>>` where `None`
//! means "never set" as opposed to "set but empty". Callers rely on that
//! distinction, so [`remove`] never drops the map itself.
//!
//! Key and value grammar follow the Kubernetes object documentation:
//!
//! - <https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/>
//! - <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use snafu::{ensure, Snafu};

const KEY_PREFIX_MAX_LEN: usize = 253;
const KEY_NAME_MAX_LEN: usize = 63;
const LABEL_VALUE_MAX_LEN: usize = 63;

// Lazily initialized regular expressions
static KEY_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z](\.?[a-zA-Z0-9-])*\.[a-zA-Z]{2,}\.?$")
        .expect("failed to compile key prefix regex")
});

static KEY_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9A-Z]([a-z0-9A-Z-_.]*[a-z0-9A-Z]+)?$")
        .expect("failed to compile key name regex")
});

static LABEL_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9A-Z]([a-z0-9A-Z-_.]*[a-z0-9A-Z]+)?$")
        .expect("failed to compile label value regex")
});

type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for key/value validation operations. Every variant is a
/// call-time contract violation; validation always runs before any mutation
/// is applied.
#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("key cannot be empty"))]
    EmptyKey,

    #[snafu(display("key {key:?} may contain at most one slash"))]
    NestedKeyPrefix { key: String },

    #[snafu(display(
        "key prefix {prefix:?} exceeds the maximum length of {KEY_PREFIX_MAX_LEN} characters"
    ))]
    KeyPrefixTooLong { prefix: String },

    #[snafu(display("key prefix {prefix:?} is not a valid DNS subdomain"))]
    InvalidKeyPrefix { prefix: String },

    #[snafu(display(
        "key name {name:?} exceeds the maximum length of {KEY_NAME_MAX_LEN} characters"
    ))]
    KeyNameTooLong { name: String },

    #[snafu(display("key name {name:?} violates the kubernetes key format"))]
    InvalidKeyName { name: String },

    #[snafu(display(
        "label value {value:?} exceeds the maximum length of {LABEL_VALUE_MAX_LEN} characters"
    ))]
    LabelValueTooLong { value: String },

    #[snafu(display("label value {value:?} violates the kubernetes label value format"))]
    InvalidLabelValue { value: String },
}

/// Which value grammar applies to a map field.
///
/// Label values are restricted to 63 characters of a fixed alphabet, while
/// annotation values are free-form strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueFormat {
    Label,
    Annotation,
}

impl ValueFormat {
    fn validate(&self, value: &str) -> Result<()> {
        match self {
            ValueFormat::Label => validate_label_value(value),
            ValueFormat::Annotation => Ok(()),
        }
    }
}

/// Validates a label/annotation key of the form `(<prefix>/)<name>`.
pub fn validate_key(key: &str) -> Result<()> {
    ensure!(!key.is_empty(), EmptyKeySnafu);

    let parts = key.split('/').collect::<Vec<_>>();
    let (prefix, name) = match parts[..] {
        [name] => (None, name),
        [prefix, name] => (Some(prefix), name),
        _ => return NestedKeyPrefixSnafu { key }.fail(),
    };

    if let Some(prefix) = prefix {
        ensure!(
            prefix.len() <= KEY_PREFIX_MAX_LEN,
            KeyPrefixTooLongSnafu { prefix }
        );
        ensure!(KEY_PREFIX_REGEX.is_match(prefix), InvalidKeyPrefixSnafu {
            prefix
        });
    }

    ensure!(name.len() <= KEY_NAME_MAX_LEN, KeyNameTooLongSnafu { name });
    ensure!(KEY_NAME_REGEX.is_match(name), InvalidKeyNameSnafu { name });

    Ok(())
}

/// Validates a label value. The empty value is explicitly permitted.
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }

    ensure!(
        value.len() <= LABEL_VALUE_MAX_LEN,
        LabelValueTooLongSnafu { value }
    );
    ensure!(LABEL_VALUE_REGEX.is_match(value), InvalidLabelValueSnafu {
        value
    });

    Ok(())
}

/// Adds or overwrites one entry, creating the map when it was never set.
pub fn insert(
    map: &mut Option<BTreeMap<String, String>>,
    key: &str,
    value: &str,
    format: ValueFormat,
) -> Result<()> {
    validate_key(key)?;
    format.validate(value)?;

    map.get_or_insert_with(BTreeMap::new)
        .insert(key.to_owned(), value.to_owned());
    Ok(())
}

/// Removes one entry if present. Removing an absent key is a no-op, and the
/// map itself is never dropped.
pub fn remove(map: &mut Option<BTreeMap<String, String>>, key: &str) {
    if let Some(map) = map {
        map.remove(key);
    }
}

/// Looks up one entry. `None` doubles as the not-found sentinel for both an
/// absent map and an absent key.
pub fn get<'a>(map: &'a Option<BTreeMap<String, String>>, key: &str) -> Option<&'a str> {
    map.as_ref()?.get(key).map(String::as_str)
}

/// Replaces the whole map. Every entry is validated before any of them is
/// applied, so a failed call leaves the previous map untouched.
pub fn replace(
    map: &mut Option<BTreeMap<String, String>>,
    entries: BTreeMap<String, String>,
    format: ValueFormat,
) -> Result<()> {
    for (key, value) in &entries {
        validate_key(key)?;
        format.validate(value)?;
    }

    *map = Some(entries);
    Ok(())
}
