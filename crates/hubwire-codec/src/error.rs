/// Errors that can occur while decoding a backplane frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A primitive needed more bytes than remained in the buffer.
    #[error("truncated buffer (needed {needed} bytes, {remaining} remaining)")]
    TruncatedBuffer { needed: usize, remaining: usize },

    /// The tag byte does not start the expected primitive family.
    #[error("malformed tag 0x{found:02x} (expected {expected})")]
    MalformedTag { expected: &'static str, found: u8 },

    /// The top-level frame array is shorter than this decoder requires.
    #[error("insufficient items in {frame} array ({actual}, need at least {expected})")]
    InsufficientFields {
        frame: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An integer was well-formed but does not fit the requested width.
    #[error("integer {value} out of range for {target}")]
    IntegerOutOfRange { value: i128, target: &'static str },

    /// A string payload is not valid UTF-8.
    #[error("string is not valid UTF-8 (at byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// Nested containers exceeded the skip depth limit.
    #[error("value nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },
}

/// Errors returned by a downstream hub message format.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct FormatError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl FormatError {
    /// Wrap any serializer error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

/// Errors that can occur while encoding a backplane frame.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A registered format failed to serialize the hub message.
    #[error("format {format:?} failed to serialize message: {source}")]
    Serialize {
        format: String,
        #[source]
        source: FormatError,
    },

    /// A length does not fit in a 32-bit MessagePack header.
    #[error("length {len} exceeds the 32-bit header limit")]
    TooLarge { len: usize },

    /// The MessagePack encoder could not write into the output buffer.
    #[error("failed to write MessagePack value: {0}")]
    Write(#[from] rmp::encode::ValueWriteError),
}

/// A group action byte outside the actions this build knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized group action {0}")]
pub struct UnrecognizedAction(pub u8);

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
