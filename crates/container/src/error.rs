use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors reported by the service container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Registration with override forbidden hit a key that is already bound.
    ///
    /// The container is left untouched; the caller may pick a different key
    /// or allow override.
    #[error("a binding already exists for '{key}'")]
    DuplicateBinding { key: String },

    /// Resolution was attempted for a key nothing was registered under.
    #[error("no binding registered for '{key}'")]
    UnboundKey { key: String },

    /// A factory bound to this key failed while producing its value.
    #[error("factory for '{key}' failed")]
    Factory {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The stored binding could not be downcast to the requested type.
    #[error("binding for '{key}' is not a '{expected}'")]
    TypeMismatch { key: String, expected: &'static str },
}
