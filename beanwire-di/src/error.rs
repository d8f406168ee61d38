use itertools::Itertools;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Shared pointer to an error raised by user code: constructors, factory operations, hooks and
/// activation tasks.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Errors related to assembling contexts, resolving properties and creating bean instances.
#[derive(Error, Clone, Debug)]
pub enum ContextError {
    #[error("Cannot find type '{type_name}' required by '{identifier}'")]
    TypeNotFound {
        identifier: String,
        type_name: String,
    },
    #[error("No {operation} of type '{type_name}' accepts the {arguments} argument(s) given to bean '{identifier}'")]
    NoApplicableCallable {
        identifier: String,
        type_name: String,
        operation: String,
        arguments: usize,
    },
    #[error("Bean '{identifier}' declares a factory bean or factory type without a factory operation")]
    InvalidFactoryConfiguration { identifier: String },
    #[error("Bean '{identifier}' cannot be created by operation '{operation}' of factory bean '{factory}'")]
    InvalidFactoryReference {
        identifier: String,
        factory: String,
        operation: String,
    },
    #[error("Failed to instantiate bean '{identifier}' of type '{type_name}': {source}")]
    InstantiationFailed {
        identifier: String,
        type_name: String,
        #[source]
        source: ErrorPtr,
    },
    #[error("Invalid initialize operation '{operation}' for bean '{identifier}'")]
    InvalidInitializeOperation {
        identifier: String,
        operation: String,
        #[source]
        source: Option<ErrorPtr>,
    },
    #[error("Active bean '{identifier}' of type '{type_name}' has no activation operation {operation:?} and is not Runnable")]
    InvalidActiveAttribution {
        identifier: String,
        type_name: String,
        operation: Option<String>,
    },
    #[error("Cannot start activation thread for bean '{identifier}': {source}")]
    ActivationFailed {
        identifier: String,
        #[source]
        source: ErrorPtr,
    },
    #[error("Cannot create a value of type '{type_name}' from string '{value}'")]
    CannotCreateFromString { type_name: String, value: String },
    #[error("Property '{property}' of type '{from}' cannot be resolved as '{to}'")]
    InvalidMorphTarget {
        property: String,
        from: String,
        to: String,
    },
    #[error("Cannot resolve placeholder: {placeholder}")]
    UnresolvablePlaceholder { placeholder: String },
    #[error("Circular reference detected: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
    #[error("Cannot find referenced bean: {identifier}")]
    UnknownBeanReference { identifier: String },
    #[error("Cannot find referenced properties: {identifier}")]
    UnknownPropertiesReference { identifier: String },
    #[error("Bean '{identifier}' refers to unknown artifact: {artifact}")]
    UnknownArtifact {
        identifier: String,
        artifact: String,
    },
    #[error("Cannot load properties '{identifier}' from {locator}: {source}")]
    PropertiesLoad {
        identifier: String,
        locator: String,
        #[source]
        source: ErrorPtr,
    },
    #[error("Cannot load artifact '{identifier}' from {locator}: {source}")]
    ArtifactLoad {
        identifier: String,
        locator: String,
        #[source]
        source: ErrorPtr,
    },
    #[error("List elements cannot be resolved as element type: {type_name}")]
    InvalidElementType { type_name: String },
    #[error("{} errors occurred: {}", .0.len(), join_messages(.0))]
    Composite(Vec<ContextError>),
}

impl ContextError {
    /// Folds a list of errors into a single one - the error itself if there's only one, or a
    /// [ContextError::Composite] otherwise. Returns `None` for an empty list.
    pub fn aggregate(mut errors: Vec<ContextError>) -> Option<ContextError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ContextError::Composite(errors)),
        }
    }
}

fn join_messages(errors: &[ContextError]) -> String {
    errors.iter().map(|error| error.to_string()).join("; ")
}

#[cfg(test)]
mod tests {
    use crate::error::ContextError;

    fn unknown(identifier: &str) -> ContextError {
        ContextError::UnknownBeanReference {
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn should_aggregate_errors() {
        assert!(ContextError::aggregate(vec![]).is_none());
        assert!(matches!(
            ContextError::aggregate(vec![unknown("a")]),
            Some(ContextError::UnknownBeanReference { .. })
        ));

        let error = ContextError::aggregate(vec![unknown("a"), unknown("b")]).unwrap();
        assert!(matches!(&error, ContextError::Composite(errors) if errors.len() == 2));
        assert_eq!(
            error.to_string(),
            "2 errors occurred: Cannot find referenced bean: a; Cannot find referenced bean: b"
        );
    }

    #[test]
    fn should_format_circular_reference() {
        let error = ContextError::CircularReference {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(error.to_string(), "Circular reference detected: a -> b -> a");
    }
}
