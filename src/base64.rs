//! Streaming base64 over the standard alphabet with `=` padding.
//!
//! [`Encoder`] and [`Decoder`] transcode arbitrarily long streams through
//! fixed-size carry buffers. The free functions are whole-buffer conveniences
//! built on the same group primitives.
//!
//! The batch decoders skip every character that is neither in the alphabet
//! nor `=`, so formatted or line-wrapped input decodes without cleanup. This
//! also means arbitrary garbage between groups is silently ignored; use the
//! streaming [`Decoder`] when malformed input must be rejected.

use std::io;

use crate::Error;
use crate::Result;

mod decoder;
mod encoder;
mod sink;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use sink::Bytes;
pub use sink::Chars;
pub use sink::Sink;

pub(crate) const PAD: u8 = b'=';

const ENCODE: [u8; 64] = *b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const INVALID: u8 = 0xFF;

static DECODE: [u8; 128] = build_decode_table();

const fn build_decode_table() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut index = 0;
    while index < ENCODE.len() {
        table[ENCODE[index] as usize] = index as u8;
        index += 1;
    }
    table
}

/// 6-bit value of an alphabet character. `None` for padding, anything
/// outside the alphabet, and every byte above `0x7f`.
#[inline]
pub(crate) fn value(byte: u8) -> Option<u8> {
    match DECODE.get(byte as usize) {
        Some(&INVALID) | None => None,
        Some(&value) => Some(value),
    }
}

#[inline]
fn is_significant(byte: u8) -> bool {
    byte == PAD || value(byte).is_some()
}

/// Encode exactly three bytes.
#[inline]
pub(crate) fn encode_group(group: &[u8]) -> [u8; 4] {
    debug_assert_eq!(group.len(), 3);
    let bits = (group[0] as u32) << 16 | (group[1] as u32) << 8 | group[2] as u32;
    [
        ENCODE[(bits >> 18 & 0b11_1111) as usize],
        ENCODE[(bits >> 12 & 0b11_1111) as usize],
        ENCODE[(bits >> 6 & 0b11_1111) as usize],
        ENCODE[(bits & 0b11_1111) as usize],
    ]
}

/// Encode a trailing group of one or two bytes with padding.
#[inline]
pub(crate) fn encode_tail(tail: &[u8]) -> [u8; 4] {
    match *tail {
        [a] => [
            ENCODE[(a >> 2) as usize],
            ENCODE[((a & 0b11) << 4) as usize],
            PAD,
            PAD,
        ],
        [a, b] => [
            ENCODE[(a >> 2) as usize],
            ENCODE[((a & 0b11) << 4 | b >> 4) as usize],
            ENCODE[((b & 0b1111) << 2) as usize],
            PAD,
        ],
        _ => unreachable!("[UNREACHABLE]: tail of {} bytes", tail.len()),
    }
}

/// Decode one group of four characters into `output`, returning how many
/// bytes it holds.
///
/// Output length follows the position of the first pad: third character
/// padded yields one byte, fourth character padded yields two. On failure,
/// returns the index of the offending character within the group.
pub(crate) fn decode_group(
    group: &[u8; 4],
    output: &mut [u8; 3],
) -> std::result::Result<usize, usize> {
    let a = value(group[0]).ok_or(0usize)?;
    let b = value(group[1]).ok_or(1usize)?;
    output[0] = a << 2 | b >> 4;

    if group[2] == PAD {
        return Ok(1);
    }

    let c = value(group[2]).ok_or(2usize)?;
    output[1] = b << 4 | c >> 2;

    if group[3] == PAD {
        return Ok(2);
    }

    let d = value(group[3]).ok_or(3usize)?;
    output[2] = c << 6 | d;
    Ok(3)
}

/// Number of characters needed to encode `len` bytes.
pub fn encoded_len(len: usize) -> usize {
    (len + 2) / 3 * 4
}

pub fn encode(data: &[u8]) -> String {
    let mut buffer = String::with_capacity(encoded_len(data.len()));
    encode_into(data, &mut buffer);
    buffer
}

/// Append the encoding of `data` to `buffer`.
pub fn encode_into(data: &[u8], buffer: &mut String) {
    let mut encoder = Encoder::new(buffer);
    encoder
        .write(data)
        .and_then(|_| encoder.complete())
        .expect("[UNREACHABLE]: write to `String` failed");
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(text.len() / 4 * 3);
    decode_into(text, &mut buffer)?;
    Ok(buffer)
}

/// Decode `text` into `sink`, skipping characters outside the alphabet.
///
/// A trailing partial group is ignored.
pub fn decode_into<W: io::Write + ?Sized>(text: &str, sink: &mut W) -> Result<()> {
    let mut group = [0u8; 4];
    let mut offsets = [0u64; 4];
    let mut pending = 0;
    let mut output = [0u8; 3];

    for (offset, byte) in text.bytes().enumerate() {
        if !is_significant(byte) {
            continue;
        }

        group[pending] = byte;
        offsets[pending] = offset as u64;
        pending += 1;

        if pending < 4 {
            continue;
        }

        pending = 0;
        match decode_group(&group, &mut output) {
            Ok(len) => sink.write_all(&output[..len])?,
            Err(index) => {
                return Err(Error::InvalidEncoding {
                    offset: offsets[index],
                    reason: String::from("padding in the first half of a group"),
                })
            }
        }
    }

    Ok(())
}

/// Whether `text` holds only alphabet characters, padding, and line breaks.
pub fn is_valid_base64(text: &str) -> bool {
    text.bytes()
        .all(|byte| is_significant(byte) || byte == b'\r' || byte == b'\n')
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encode_examples() {
        assert_eq!(encode(b"Man"), "TWFu");
        assert_eq!(encode(b"Ma"), "TWE=");
        assert_eq!(encode(b"M"), "TQ==");
        assert_eq!(encode(b""), "");
        assert_eq!(encode(&[0xFB, 0xFF, 0xBF]), "+/+/");
    }

    #[test]
    fn decode_examples() -> anyhow::Result<()> {
        assert_eq!(decode("TWE=")?, [0x4Du8, 0x61]);
        assert_eq!(decode("TQ==")?, [0x4Du8]);
        assert_eq!(decode("TWFu")?, b"Man");
        assert_eq!(decode("")?, b"");
        Ok(())
    }

    #[test]
    fn decode_skips_noise() -> anyhow::Result<()> {
        assert_eq!(decode("TW\r\nFu TW\tE=")?, b"ManMa");
        assert_eq!(decode("T*W#F!u")?, b"Man");
        assert_eq!(decode("TWF\u{e9}u")?, b"Man");
        Ok(())
    }

    #[test]
    fn decode_ignores_partial_tail() -> anyhow::Result<()> {
        assert_eq!(decode("TWFuTW")?, b"Man");
        Ok(())
    }

    #[test]
    fn decode_rejects_leading_padding() {
        match decode("TWFu=AAA") {
            Err(Error::InvalidEncoding { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("Expected invalid encoding, but found {:?}", other),
        }
    }

    #[test]
    fn pad_position_decides_length() {
        let mut output = [0u8; 3];
        assert_eq!(decode_group(b"TQ==", &mut output), Ok(1));
        assert_eq!(decode_group(b"TWE=", &mut output), Ok(2));
        assert_eq!(decode_group(b"TQ=A", &mut output), Ok(1));
        assert_eq!(decode_group(b"T=QA", &mut output), Err(1));
    }

    #[test]
    fn validity() {
        assert!(is_valid_base64("TWFu\r\nTWE="));
        assert!(is_valid_base64(""));
        assert!(!is_valid_base64("TW Fu"));
        assert!(!is_valid_base64("TWF\u{e9}"));
        assert!(!is_valid_base64("TW-_"));
    }

    #[test]
    fn decode_table_covers_alphabet() {
        for (index, byte) in ENCODE.iter().enumerate() {
            assert_eq!(value(*byte), Some(index as u8));
        }
        assert_eq!(value(PAD), None);
        assert_eq!(value(0x80), None);
        assert_eq!(value(0xFF), None);
    }

    #[test]
    fn padding_by_length() {
        for len in 0..32 {
            let encoded = encode(&vec![0xA5; len]);
            assert_eq!(encoded.len(), encoded_len(len));
            match len % 3 {
                0 => assert!(!encoded.ends_with('=')),
                1 => assert!(encoded.ends_with("==")),
                _ => assert!(encoded.ends_with('=') && !encoded.ends_with("==")),
            }
        }
    }

    proptest! {
        #[test]
        fn round_trip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let encoded = encode(&data);
            prop_assert!(is_valid_base64(&encoded));
            prop_assert_eq!(decode(&encoded).unwrap(), data);
        }
    }
}
