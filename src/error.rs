use thiserror::Error;

/// Failures of the capture flow. All of them leave the session without an
/// open camera stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("could not encode captured frame: {0}")]
    EncodingFailure(String),
    #[error("not a supported image: {0}")]
    InvalidImage(String),
    #[error("a capture is already in progress")]
    AlreadyActive,
    #[error("capture was cancelled")]
    Cancelled,
    #[error("unknown product '{0}'")]
    UnknownProduct(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CaptureError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::DeviceUnavailable(_) => {
                "Could not access camera. Please allow permissions.".into()
            }
            CaptureError::EncodingFailure(_) => "Could not capture photo. Please try again.".into(),
            other => other.to_string(),
        }
    }
}

/// Failures at the AI collaborator boundary. Call sites convert these into
/// fallback values instead of surfacing them.
#[derive(Debug, Error)]
pub enum StylistError {
    #[error("API key is missing; set {}", crate::settings::API_KEY_ENV)]
    MissingCredential,
    #[error("stylist service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("malformed stylist response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for StylistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StylistError::MalformedResponse(err.to_string())
        } else {
            StylistError::ServiceUnavailable(err.to_string())
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutfitError {
    #[error("Describe a garment to style first.")]
    EmptyDescription,
    #[error("Could not generate recommendations. Please try again.")]
    NoRecommendations,
}
