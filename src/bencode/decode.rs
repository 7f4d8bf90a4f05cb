use indexmap::IndexMap;
use log::{debug, warn};

use super::error::BencodeError;
use crate::bencode::bvalue::BValue;

/// Nesting limit used when the caller doesn't pick one.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest allowed chain of nested lists/dicts.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Decodes a single value from the front of `input`, returning how many
/// bytes it used. Anything after the value is left alone.
pub fn decode_bencode(input: &[u8]) -> Result<(usize, BValue), BencodeError> {
    decode_bencode_at(input, 0, DecodeOptions::default())
}

/// Decodes a single value starting at `offset`. The returned count is the
/// number of bytes consumed from `offset`, and error offsets are absolute.
pub fn decode_bencode_at(
    input: &[u8],
    offset: usize,
    options: DecodeOptions,
) -> Result<(usize, BValue), BencodeError> {
    let mut decoder = Decoder {
        input,
        pos: offset,
        max_depth: options.max_depth,
    };
    if decoder.peek().is_none() {
        return Err(BencodeError::UnexpectedEnd { offset });
    }
    let value = decoder.value(0)?;
    Ok((decoder.pos - offset, value))
}

/// Decodes a whole .torrent buffer: exactly one dictionary and nothing after it.
pub fn decode_torrent(input: &[u8], options: DecodeOptions) -> Result<BValue, BencodeError> {
    let (consumed, value) = decode_bencode_at(input, 0, options)?;

    if !matches!(value, BValue::Dict(_)) {
        return Err(BencodeError::NotADictionary);
    }

    if consumed != input.len() {
        return Err(BencodeError::TrailingData {
            offset: consumed,
            remaining: input.len() - consumed,
        });
    }

    if !value.has_sorted_keys() {
        debug!("top-level dictionary keys are not in sorted order");
    }
    debug!("decoded {} bytes of bencode", consumed);
    Ok(value)
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// `depth` is the number of containers enclosing this value.
    fn value(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        match self.peek() {
            Some(b'i') => self.integer(),
            Some(b'l') => self.list(depth),
            Some(b'd') => self.dict(depth),
            Some(c) if c.is_ascii_digit() => self.byte_string().map(BValue::ByteString),
            Some(c) => Err(BencodeError::UnknownTypeTag {
                offset: self.pos,
                tag: c as char,
            }),
            None => Err(BencodeError::UnexpectedEnd { offset: self.pos }),
        }
    }

    fn integer(&mut self) -> Result<BValue, BencodeError> {
        let start = self.pos;
        let malformed = |reason: &str| BencodeError::MalformedInteger {
            offset: start,
            reason: reason.to_string(),
        };

        self.pos += 1; // skip 'i'
        let digits_start = self.pos;
        while self.peek().is_some_and(|b| b != b'e') {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(malformed("missing terminating 'e'"));
        }

        let text = &self.input[digits_start..self.pos];
        let digits = text.strip_prefix(b"-").unwrap_or(text);
        let negative = digits.len() != text.len();

        if digits.is_empty() {
            return Err(malformed("no digits"));
        }
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(malformed("non-digit character"));
        }
        if digits[0] == b'0' && negative {
            return Err(malformed("negative zero"));
        }
        if digits[0] == b'0' && digits.len() > 1 {
            return Err(malformed("leading zero"));
        }

        // All ASCII at this point.
        let parsed = std::str::from_utf8(text)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| malformed("out of range for i64"))?;

        self.pos += 1; // skip 'e'
        Ok(BValue::Integer(parsed))
    }

    /// Reads `<length>:<bytes>`.
    fn byte_string(&mut self) -> Result<Vec<u8>, BencodeError> {
        let start = self.pos;
        let malformed = |reason: String| BencodeError::MalformedString {
            offset: start,
            reason,
        };

        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let length_digits = &self.input[start..self.pos];
        if length_digits.is_empty() {
            return Err(malformed("missing length prefix".to_string()));
        }
        match self.peek() {
            Some(b':') => {}
            Some(c) => {
                return Err(malformed(format!(
                    "expected ':' after length, found {:?}",
                    c as char
                )))
            }
            None => return Err(malformed("missing ':' after length".to_string())),
        }

        let length = std::str::from_utf8(length_digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| malformed("length prefix out of range".to_string()))?;

        self.pos += 1; // skip ':'
        let remaining = self.input.len() - self.pos;
        if length > remaining {
            return Err(malformed(format!(
                "declared {} bytes but only {} remain",
                length, remaining
            )));
        }

        let data = self.input[self.pos..self.pos + length].to_vec();
        self.pos += length;
        Ok(data)
    }

    fn enter(&self, depth: usize) -> Result<usize, BencodeError> {
        let level = depth + 1;
        if level > self.max_depth {
            return Err(BencodeError::NestingTooDeep {
                offset: self.pos,
                max_depth: self.max_depth,
            });
        }
        Ok(level)
    }

    fn list(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        let level = self.enter(depth)?;
        let start = self.pos;
        self.pos += 1; // skip 'l'

        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(BencodeError::UnterminatedList { offset: start }),
                Some(b'e') => break,
                Some(_) => items.push(self.value(level)?),
            }
        }

        self.pos += 1; // skip 'e'
        Ok(BValue::List(items))
    }

    fn dict(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        let level = self.enter(depth)?;
        let start = self.pos;
        self.pos += 1; // skip 'd'

        let mut map = IndexMap::new();
        loop {
            let key = match self.peek() {
                None => return Err(BencodeError::UnterminatedDict { offset: start }),
                Some(b'e') => break,
                Some(c) if c.is_ascii_digit() => self.byte_string()?,
                Some(_) => return Err(BencodeError::MalformedDictKey { offset: self.pos }),
            };

            if self.peek().is_none() {
                return Err(BencodeError::UnterminatedDict { offset: start });
            }
            let value = self.value(level)?;

            if map.insert(key.clone(), value).is_some() {
                warn!(
                    "duplicate dictionary key {:?} at byte {}, keeping the last value",
                    String::from_utf8_lossy(&key),
                    start
                );
            }
        }

        self.pos += 1; // skip 'e'
        Ok(BValue::Dict(map))
    }
}
