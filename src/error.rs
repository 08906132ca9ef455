//! Fatal errors on the text-to-binary path. Every variant that originates
//! from input text carries the source file name and 1-based line number;
//! there is no recovery or resynchronization after any of them.

use std::io;

/// Grammar violation inside one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("expected '{0}'")]
    Expected(char),
    #[error("expected hex tag value")]
    ExpectedTag,
    #[error("TLV tag value may not exceed 0x1fff")]
    TagTooLarge,
    #[error("unexpected flag")]
    UnexpectedFlag,
    #[error("string value too large")]
    StringTooLarge,
    #[error("hex payload has an odd number of digits")]
    OddHexDigit,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected character")]
    UnexpectedCharacter,
}

/// Violation of the indentation-derived hierarchy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndentationError {
    #[error("bad backwards indentation - no matching level")]
    NoMatchingLevel,
    #[error("bad backwards indentation - whitespace mismatch")]
    WhitespaceMismatch,
    #[error("indentation is not an extension of the previous level")]
    NotAPrefix,
    #[error("a TLV with explicit data may not have nested elements")]
    DataWithChildren,
}

/// Constraint failure while re-serializing to binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("unable to fit data into TLV8")]
    ForcedTlv8Overflow,
    #[error("payload length exceeds the 16-bit length field")]
    PayloadTooLarge,
    #[error("encoded TLV does not fit into the output buffer")]
    BufferOverflow,
    #[error("length should be 0 when not a composite")]
    DataWithChildren,
}

/// Any fatal failure while converting text back to binary.
#[derive(Debug, thiserror::Error)]
pub enum UndumpError {
    #[error("{file}:{line} - {source}")]
    Format {
        file: String,
        line: usize,
        source: FormatError,
    },
    #[error("{file}:{line} - {source}")]
    Indentation {
        file: String,
        line: usize,
        source: IndentationError,
    },
    #[error("{file}:{line} - {source}")]
    Encoding {
        file: String,
        line: usize,
        source: EncodingError,
    },
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
}

impl UndumpError {
    pub fn format(file: &str, line: usize, source: FormatError) -> Self {
        UndumpError::Format {
            file: file.to_string(),
            line,
            source,
        }
    }

    pub fn indentation(file: &str, line: usize, source: IndentationError) -> Self {
        UndumpError::Indentation {
            file: file.to_string(),
            line,
            source,
        }
    }

    pub fn encoding(file: &str, line: usize, source: EncodingError) -> Self {
        UndumpError::Encoding {
            file: file.to_string(),
            line,
            source,
        }
    }
}
