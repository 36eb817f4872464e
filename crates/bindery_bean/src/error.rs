use thiserror::Error;

// -----------------------------------------------------------------------------
// BuildError

/// A configuration fault detected while building a type's descriptor.
///
/// Build errors identify the offending type (and member, where one exists),
/// abort that type's build, and cache nothing; sibling types are unaffected
/// and a corrected declaration can succeed later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// `Include` and `Exclude` markers on one member claim the same facet.
    #[error("conflicting include and exclude markers on {member} of `{type_path}`")]
    ConflictingMarkers {
        type_path: &'static str,
        member: String,
    },

    /// Two same-role candidates resolved to the same logical name at the
    /// same depth, e.g. `get_x` and `is_x`.
    #[error("duplicate {role} candidates for property `{name}` on `{type_path}`")]
    DuplicateMember {
        type_path: &'static str,
        name: String,
        role: &'static str,
    },

    /// More than one creator was designated, or several undesignated
    /// argument creators were equally eligible.
    #[error("ambiguous creator selection for `{type_path}`")]
    AmbiguousCreator { type_path: &'static str },

    /// No declared creator is usable under the current configuration.
    #[error("no usable creator for `{type_path}`")]
    NoCreator { type_path: &'static str },

    /// A creator parameter has neither a recorded source name nor a
    /// `Rename` marker.
    #[error("cannot resolve a name for creator parameter {index} of `{type_path}`")]
    UnnamedCreatorParam {
        type_path: &'static str,
        index: usize,
    },

    /// A member references a generic parameter the instantiation does not
    /// bind.
    #[error("type parameter `{param}` of `{type_path}` is not bound by the instantiation")]
    UnboundTypeParam {
        type_path: &'static str,
        param: &'static str,
    },

    /// No converter is registered for a member's value type and the type is
    /// not a bean.
    #[error("no converter for `{value_type}` ({context})")]
    NoConverter {
        value_type: &'static str,
        context: String,
    },

    /// A descriptor was requested for a tag with no class declaration.
    #[error("no class declaration for `{type_path}`")]
    MissingDecl { type_path: &'static str },

    /// The declaration found behind a tag describes a different type.
    /// Reported at provide time when declaration verification is on.
    #[error("declaration for `{declared}` does not match the requested type `{requested}`")]
    DeclMismatch {
        requested: &'static str,
        declared: &'static str,
    },
}

// -----------------------------------------------------------------------------
// BindError

/// A failure while converting values through a descriptor.
///
/// Type mismatches are a distinct, catchable kind and are never conflated
/// with configuration errors: a descriptor invoked against a value of the
/// wrong runtime type reports [`BindError::TypeMismatch`], while a bad
/// declaration surfaces as [`BindError::Build`].
#[derive(Debug, Error)]
pub enum BindError {
    /// A configuration fault surfaced on first use of the type.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The value is not an instance of the type the descriptor was built
    /// for.
    #[error("value is not an instance of `{expected}`")]
    TypeMismatch { expected: &'static str },

    /// Context wrapper naming the property in which a nested conversion
    /// failed.
    #[error("property `{property}` of `{type_path}`: {source}")]
    Property {
        type_path: &'static str,
        property: String,
        source: Box<BindError>,
    },

    /// The wire tree had the wrong shape, e.g. an array where an object was
    /// expected.
    #[error("expected {expected} for `{type_path}`, found {found}")]
    UnexpectedShape {
        type_path: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Parsing, printing, or a serde-backed conversion failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BindError {
    /// Wraps the error with the property it occurred in.
    pub(crate) fn in_property(self, type_path: &'static str, property: impl Into<String>) -> Self {
        BindError::Property {
            type_path,
            property: property.into(),
            source: Box::new(self),
        }
    }

    /// Returns `true` if this error is a type mismatch, looking through
    /// property context wrappers.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            BindError::TypeMismatch { .. } => true,
            BindError::Property { source, .. } => source.is_type_mismatch(),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_name_the_type() {
        let err = BuildError::AmbiguousCreator {
            type_path: "demo::Order",
        };
        assert_eq!(
            err.to_string(),
            "ambiguous creator selection for `demo::Order`"
        );
    }

    #[test]
    fn property_wrapper_nests_messages() {
        let inner = BindError::TypeMismatch {
            expected: "demo::Address",
        };
        let wrapped = inner.in_property("demo::Person", "address");
        assert_eq!(
            wrapped.to_string(),
            "property `address` of `demo::Person`: value is not an instance of `demo::Address`"
        );
        assert!(wrapped.is_type_mismatch());
    }

    #[test]
    fn build_errors_are_not_type_mismatches() {
        let err = BindError::Build(BuildError::NoCreator {
            type_path: "demo::Order",
        });
        assert!(!err.is_type_mismatch());
    }
}
