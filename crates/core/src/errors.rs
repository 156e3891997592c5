use thiserror::Error;

/// Failures raised while handling a request. The assistant answers every
/// well-formed message, so only the request itself can be wrong.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Message safe to show in the chat widget.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "No pude procesar tu mensaje. Revisa lo que enviaste e inténtalo de nuevo."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        match self {
            Self::InvalidInput(message) => {
                InterfaceError::BadRequest { message, correlation_id: correlation_id.into() }
            }
        }
    }
}
