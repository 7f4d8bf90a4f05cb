use serde::Serializer;

/// Bytes as text, with invalid UTF-8 sequences replaced.
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decides whether a byte string can be shown as-is.
///
/// In ASCII-only mode every byte must be printable ASCII (letters, digits,
/// punctuation or whitespace). Otherwise the bytes must be valid UTF-8 with
/// no C0/C1 control characters.
pub fn is_printable(bytes: &[u8], ascii_only: bool) -> bool {
    if ascii_only {
        return bytes
            .iter()
            .all(|&b| b.is_ascii_graphic() || b" \t\n\r\x0b\x0c".contains(&b));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => !text.chars().any(is_control),
        Err(_) => false,
    }
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

/// Serde adapter writing raw bytes as a (lossy) string.
pub fn as_lossy_text<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(bytes.as_ref()))
}

/// Serde adapter writing a list of path components as a list of strings.
pub fn as_lossy_components<C, S>(components: &C, serializer: S) -> Result<S::Ok, S::Error>
where
    C: AsRef<[Vec<u8>]>,
    S: Serializer,
{
    serializer.collect_seq(components.as_ref().iter().map(|c| lossy(c)))
}

/// Serde adapter writing any `Display` value as a string.
pub fn as_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_is_printable() {
        assert!(is_printable(b"ubuntu-24.04.iso", true));
        assert!(is_printable(b"ubuntu-24.04.iso", false));
    }

    #[test]
    fn test_utf8_only_printable_outside_ascii_mode() {
        let name = "caf\u{e9}.txt".as_bytes();
        assert!(is_printable(name, false));
        assert!(!is_printable(name, true));
    }

    #[test]
    fn test_binary_is_not_printable() {
        assert!(!is_printable(&[0x00, 0x14, 0xfe], false));
        assert!(!is_printable(b"abc\x07", false));
        assert!(!is_printable(&[0xc3], false));
    }

    #[test]
    fn test_lossy_replaces_invalid_sequences() {
        assert_eq!(lossy(b"a\xffb"), "a\u{fffd}b");
    }
}
