//! Error types for the calorie_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a failure carries nothing better to say
pub const GENERIC_FAILURE: &str = "Something went wrong.";

/// Core error type for calorie_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected before any storage or auth call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rejected by the auth provider
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Storage collaborator refused or failed a read/write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// A mutating operation is already in flight
    #[error("Another operation is still in progress")]
    Busy,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Best human-readable text for a transient notice.
    ///
    /// Internal detail (paths, parser positions) is never shown; those
    /// variants degrade to [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::Storage(msg) | Error::Other(msg) => {
                non_empty_or_generic(msg)
            }
            Error::Auth(err) => err.user_message(),
            Error::NotSignedIn => "Please sign in to continue.".to_string(),
            Error::Busy => "Please wait for the current save to finish.".to_string(),
            Error::Config(msg) => format!("Configuration problem: {}", msg),
            Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Toml(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }
}

fn non_empty_or_generic(msg: &str) -> String {
    if msg.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        msg.to_string()
    }
}

/// Failure reported by an auth provider, keyed by a provider error code
/// such as `auth/invalid-credential`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Map the provider code to the message a user should see.
    pub fn user_message(&self) -> String {
        let known = match self.code.as_str() {
            "auth/email-already-in-use" => Some("That email is already registered."),
            "auth/invalid-credential" | "auth/wrong-password" => {
                Some("Invalid email or password.")
            }
            "auth/user-not-found" => Some("No account found with that email."),
            "auth/too-many-requests" => Some("Too many attempts. Please try again later."),
            "auth/popup-closed-by-user" => {
                Some("Google sign-in was closed before completing.")
            }
            _ => None,
        };

        match known {
            Some(msg) => msg.to_string(),
            None => non_empty_or_generic(&self.message),
        }
    }
}
