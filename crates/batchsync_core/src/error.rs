use thiserror::Error;

/// Failures surfaced by the remote job accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Bad client input; the request never reached the network.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No response was received (connect failure, reset, client timeout).
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    /// The request was valid but the job or item is in the wrong state.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Transport failures are retried by the poller without clearing cached data.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Conflict(_) => Some(409),
            ApiError::NotFound(_) => Some(404),
            ApiError::Validation(_) | ApiError::Transport(_) => None,
        }
    }

    /// Message text as received, without the variant prefix.
    pub fn raw_message(&self) -> &str {
        match self {
            ApiError::Validation(message)
            | ApiError::Transport(message)
            | ApiError::Conflict(message)
            | ApiError::NotFound(message) => message,
            ApiError::Server { message, .. } => message,
        }
    }
}

const GENERIC_FALLBACK: &str = "Something went wrong";
const RAW_MESSAGE_LIMIT: usize = 200;

/// Server phrases mapped to user-facing text. Order matters: the first
/// phrase contained in the message wins.
const PHRASES: &[(&str, &str)] = &[
    ("invalid credentials", "Incorrect email or password"),
    ("user not found", "No account found with that email"),
    ("email already registered", "An account with this email already exists"),
    ("email already exists", "An account with this email already exists"),
    ("invalid token", "Your session has expired, please log in again"),
    ("token expired", "Your session has expired, please log in again"),
    ("not verified", "Please verify your email before continuing"),
    ("account inactive", "Your account has been deactivated"),
    ("api key not found", "API key not found"),
    ("api key already revoked", "This API key has already been revoked"),
    ("no text detected", "No text was detected in the image"),
    ("unsupported language", "That language is not supported"),
    ("file too large", "Image is too large, maximum size is 10 MB"),
    ("invalid file type", "Unsupported file type, use JPEG, PNG, or WebP"),
    ("rate limit exceeded", "Too many requests, please wait a moment and try again"),
    ("quota exceeded", "Monthly translation quota reached, upgrade your plan for more"),
    ("internal server error", "Something went wrong on our end, please try again"),
    ("service unavailable", "The service is temporarily unavailable, please try again shortly"),
    ("network error", "Could not reach the server, check your connection"),
];

/// Turns an accessor error into text fit for a toast.
///
/// Known phrases are matched case-insensitively. Short client-error messages
/// are passed through as-is; everything else gets `fallback`.
pub fn friendly_message(error: &ApiError, fallback: Option<&str>) -> String {
    let fallback = fallback.unwrap_or(GENERIC_FALLBACK);
    let raw = error.raw_message().trim();
    if raw.is_empty() {
        return fallback.to_string();
    }

    let lower = raw.to_lowercase();
    if let Some((_, friendly)) = PHRASES.iter().find(|(phrase, _)| lower.contains(phrase)) {
        return (*friendly).to_string();
    }

    let show_raw = match error {
        ApiError::Validation(_) => true,
        _ => error
            .status_code()
            .is_some_and(|status| (400..500).contains(&status)),
    };
    if show_raw && raw.len() < RAW_MESSAGE_LIMIT {
        raw.to_string()
    } else {
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_phrase_wins_over_raw_text() {
        let err = ApiError::Server {
            status: 429,
            message: "Rate limit exceeded for key abc".into(),
        };
        assert_eq!(
            friendly_message(&err, None),
            "Too many requests, please wait a moment and try again"
        );
    }

    #[test]
    fn short_client_errors_pass_through() {
        let err = ApiError::Conflict("Batch is already finished".into());
        assert_eq!(friendly_message(&err, None), "Batch is already finished");
    }

    #[test]
    fn server_faults_use_fallback() {
        let err = ApiError::Server {
            status: 502,
            message: "upstream exploded".into(),
        };
        assert_eq!(friendly_message(&err, Some("Try again")), "Try again");
        let err = ApiError::Transport("connection reset".into());
        assert_eq!(friendly_message(&err, None), GENERIC_FALLBACK);
    }

    #[test]
    fn long_client_errors_use_fallback() {
        let err = ApiError::Server {
            status: 422,
            message: "x".repeat(RAW_MESSAGE_LIMIT),
        };
        assert_eq!(friendly_message(&err, None), GENERIC_FALLBACK);
    }
}
