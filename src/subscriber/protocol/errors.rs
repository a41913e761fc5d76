#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    Invalid(String),
    /// Header announced a payload larger than the client accepts.
    FrameTooLarge { len: usize, max: usize },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Invalid(msg) => write!(f, "{}", msg),
            ProtocolError::FrameTooLarge { len, max } => {
                write!(f, "frame payload of {} bytes exceeds limit of {}", len, max)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<std::io::Error> for ProtocolError {
    fn from(error: std::io::Error) -> Self {
        ProtocolError::Invalid(error.to_string())
    }
}
