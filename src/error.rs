use thiserror::Error;

/// The central error type for all operations in scramblery.
#[derive(Error, Debug)]
pub enum ScrambleError {
    #[error("No face detected in the image")]
    NoFaceDetected,

    #[error("Invalid scramble type: {0}")]
    InvalidStrategy(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Landmark file is malformed: {0}")]
    LandmarkFormat(#[from] serde_json::Error),

    #[error("Video error: {0}")]
    Video(String),
}

// Foreign error payloads cannot be compared, so only their variant is matched.
impl PartialEq for ScrambleError {
    fn eq(&self, other: &Self) -> bool {
        use ScrambleError::*;
        match (self, other) {
            (NoFaceDetected, NoFaceDetected) => true,
            (InvalidStrategy(a), InvalidStrategy(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (Configuration(a), Configuration(b)) => a == b,
            (Video(a), Video(b)) => a == b,
            (ImageError(_), ImageError(_)) => true,
            (IoError(_), IoError(_)) => true,
            (LandmarkFormat(_), LandmarkFormat(_)) => true,
            _ => false,
        }
    }
}

/// A centralized result type for the library.
pub type Result<T> = std::result::Result<T, ScrambleError>;
