use alloc::string::String;
use core::fmt;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Configuration errors

/// The reason a mapping tree was rejected, see [`InvalidMappingError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidMappingKind {
    #[error("mapping has neither a parser nor a renderer (a useless mapping)")]
    UselessMapping,

    #[error("composite mapping must have at least one component")]
    NoComponents,

    #[error("composite component `{0}` is mapped more than once")]
    DuplicateComponent(String),

    #[error("composite mapping has no parser and at least one component has no renderer")]
    CompositeWithoutParser,

    #[error("comma-separated collections require a simple item mapping")]
    CommaSeparatedRequiresSimple,

    #[error("items of a comma-separated collection cannot have a flag key")]
    FlaggedCommaSeparatedItem,

    #[error("collection items cannot be mapped as collections")]
    UnsupportedItem,

    #[error("class mapping cannot combine `map_as` with property mappings")]
    MapAsWithProperties,

    #[error("`map_as` only supports simple and composite mappings")]
    UnsupportedMapAs,

    #[error("class mapping has neither property mappings nor `map_as`")]
    EmptyClass,

    #[error("class mapping has property mappings but no factory")]
    MissingFactory,

    #[error("property `{0}` is mapped more than once")]
    DuplicateProperty(String),

    #[error("simple mapping has no renderer, so it cannot serialize")]
    MissingRenderer,

    #[error("simple mapping has no parser, so it cannot deserialize")]
    MissingParser,
}

/// A configuration error found while validating a mapping tree.
///
/// These errors do not depend on any particular data: they are reported
/// by [`KeyValueSerializer::new`] or, for a missing parser or renderer,
/// before the first key is read or written.
///
/// [`KeyValueSerializer::new`]: crate::KeyValueSerializer::new
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid mapping at `{path}`: {kind}")]
pub struct InvalidMappingError {
    path: String,
    kind: InvalidMappingKind,
}

impl InvalidMappingError {
    #[inline]
    pub(crate) fn new(path: impl Into<String>, kind: InvalidMappingKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The property path of the offending node, e.g. `Person.Birthday`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the reason the node was rejected.
    #[inline]
    pub fn kind(&self) -> &InvalidMappingKind {
        &self.kind
    }
}

// -----------------------------------------------------------------------------
// Mandatory failures

/// The direction of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Serialize,
    Deserialize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize => f.write_str("serialize"),
            Self::Deserialize => f.write_str("deserialize"),
        }
    }
}

/// A mandatory node failed to produce or consume its value.
///
/// Aborts the whole call it happened in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("mandatory mapping for key `{key}` failed to {operation}")]
pub struct MandatoryError {
    key: String,
    operation: Operation,
}

impl MandatoryError {
    #[cold]
    #[inline(never)]
    pub(crate) fn new(key: String, operation: Operation) -> Self {
        Self { key, operation }
    }

    /// The computed key of the failing node.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

// -----------------------------------------------------------------------------
// Error

/// Any error returned by [`KeyValueSerializer`](crate::KeyValueSerializer) calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    InvalidMapping(#[from] InvalidMappingError),

    #[error(transparent)]
    Mandatory(#[from] MandatoryError),
}

impl Error {
    /// Returns the mandatory failure, if this is one.
    #[inline]
    pub fn as_mandatory(&self) -> Option<&MandatoryError> {
        match self {
            Self::Mandatory(error) => Some(error),
            Self::InvalidMapping(_) => None,
        }
    }

    /// Returns the configuration error, if this is one.
    #[inline]
    pub fn as_invalid_mapping(&self) -> Option<&InvalidMappingError> {
        match self {
            Self::InvalidMapping(error) => Some(error),
            Self::Mandatory(_) => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Error, InvalidMappingError, InvalidMappingKind, MandatoryError, Operation};
    use alloc::string::{String, ToString};

    #[test]
    fn messages() {
        let error = InvalidMappingError::new("Person.Birthday", InvalidMappingKind::NoComponents);
        assert_eq!(
            error.to_string(),
            "invalid mapping at `Person.Birthday`: composite mapping must have at least one component"
        );

        let error = MandatoryError::new(String::from("Name"), Operation::Deserialize);
        assert_eq!(
            error.to_string(),
            "mandatory mapping for key `Name` failed to deserialize"
        );

        let error: Error = error.into();
        assert_eq!(error.as_mandatory().map(MandatoryError::key), Some("Name"));
        assert!(error.as_invalid_mapping().is_none());
    }
}
