use thiserror::Error;

/// Failures while decoding bencode. Positional variants carry the byte offset
/// where the decoder gave up.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
    #[error("Unexpected end of input at byte {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("Malformed integer at byte {offset}: {reason}")]
    MalformedInteger { offset: usize, reason: String },

    #[error("Malformed string at byte {offset}: {reason}")]
    MalformedString { offset: usize, reason: String },

    #[error("Unterminated list starting at byte {offset}")]
    UnterminatedList { offset: usize },

    #[error("Unterminated dictionary starting at byte {offset}")]
    UnterminatedDict { offset: usize },

    #[error("Dictionary key at byte {offset} is not a byte string")]
    MalformedDictKey { offset: usize },

    #[error("Unknown type tag {tag:?} at byte {offset}")]
    UnknownTypeTag { offset: usize, tag: char },

    #[error("Nesting deeper than {max_depth} levels at byte {offset}")]
    NestingTooDeep { offset: usize, max_depth: usize },

    #[error("{remaining} trailing bytes after value ending at byte {offset}")]
    TrailingData { offset: usize, remaining: usize },

    #[error("Top-level value is not a dictionary")]
    NotADictionary,
}

impl BencodeError {
    /// Offset into the input where decoding failed, if the failure is positional.
    pub fn offset(&self) -> Option<usize> {
        match self {
            BencodeError::UnexpectedEnd { offset }
            | BencodeError::MalformedInteger { offset, .. }
            | BencodeError::MalformedString { offset, .. }
            | BencodeError::UnterminatedList { offset }
            | BencodeError::UnterminatedDict { offset }
            | BencodeError::MalformedDictKey { offset }
            | BencodeError::UnknownTypeTag { offset, .. }
            | BencodeError::NestingTooDeep { offset, .. }
            | BencodeError::TrailingData { offset, .. } => Some(*offset),
            BencodeError::NotADictionary => None,
        }
    }
}
