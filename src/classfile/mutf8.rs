//! Modified UTF-8 as used by `CONSTANT_Utf8_info` (JVMS §4.4.7).
//!
//! Modified UTF-8 differs from standard UTF-8 in two ways: the null character is encoded as the
//! two bytes `0xC0 0x80`, and supplementary characters are encoded as a surrogate pair with
//! each surrogate taking three bytes. All other characters encode identically, so plain ASCII
//! class names are the same in both forms.

use crate::Result;

/// Encodes `value` as modified UTF-8.
#[must_use]
pub fn encode(value: &str) -> Vec<u8> {
    if value.bytes().all(|b| b != 0 && b < 0x80) {
        return value.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(value.len() + 4);
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decodes modified UTF-8 bytes into a `String`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] on raw null bytes, truncated or invalid sequences and
/// unpaired surrogates.
pub fn decode(bytes: &[u8]) -> Result<String> {
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        // ASCII is valid UTF-8
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| malformed_error!("Invalid modified UTF-8 sequence"));
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut position = 0;
    while position < bytes.len() {
        let first = bytes[position];
        match first {
            0x01..=0x7F => {
                units.push(u16::from(first));
                position += 1;
            }
            0xC0..=0xDF => {
                let second = continuation(bytes, position + 1)?;
                units.push((u16::from(first & 0x1F) << 6) | second);
                position += 2;
            }
            0xE0..=0xEF => {
                let second = continuation(bytes, position + 1)?;
                let third = continuation(bytes, position + 2)?;
                units.push((u16::from(first & 0x0F) << 12) | (second << 6) | third);
                position += 3;
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte 0x{:02X} at {}",
                    first,
                    position
                ))
            }
        }
    }

    String::from_utf16(&units).map_err(|_| malformed_error!("Unpaired surrogate in modified UTF-8"))
}

fn continuation(bytes: &[u8], position: usize) -> Result<u16> {
    match bytes.get(position) {
        Some(&byte) if byte & 0xC0 == 0x80 => Ok(u16::from(byte & 0x3F)),
        Some(&byte) => Err(malformed_error!(
            "Invalid modified UTF-8 continuation byte 0x{:02X} at {}",
            byte,
            position
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_unchanged() {
        assert_eq!(encode("com/app/R$string"), b"com/app/R$string".to_vec());
        assert_eq!(decode(b"com/app/R$string").unwrap(), "com/app/R$string");
    }

    #[test]
    fn null_uses_two_bytes() {
        assert_eq!(encode("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
        assert!(decode(&[b'a', 0x00]).is_err());
    }

    #[test]
    fn bmp_matches_utf8() {
        let value = "pkg/Ünïcödé/中文";
        assert_eq!(encode(value), value.as_bytes().to_vec());
        assert_eq!(decode(value.as_bytes()).unwrap(), value);
    }

    #[test]
    fn supplementary_uses_surrogates() {
        let value = "x\u{1F600}";
        let encoded = encode(value);
        assert_eq!(encoded, vec![b'x', 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn malformed_sequences() {
        assert!(decode(&[0xC3]).is_err());
        assert!(decode(&[0xE4, 0xB8]).is_err());
        assert!(decode(&[0xC3, 0x41]).is_err());
        assert!(decode(&[0xF0, 0x9F, 0x98, 0x80]).is_err());
        assert!(decode(&[0xED, 0xA0, 0xBD]).is_err());
    }
}
