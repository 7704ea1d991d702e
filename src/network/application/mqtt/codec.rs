//! Wire primitives shared by every MQTT packet.
//!
//! MQTT 3.1.1 frames each packet with a *remaining length*: the byte count of
//! everything after the fixed header, written as a base-128 variable-byte
//! integer of one to four digits. Strings and binary fields inside a packet
//! carry a two-byte big-endian length prefix.

use alloc::vec::Vec;

use super::error::{Error, Result};

/// Largest value a four-digit variable-byte integer can hold.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// Largest length-prefixed field (strings, client id, credentials).
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Maximum number of digits in a remaining-length encoding.
pub const MAX_LENGTH_DIGITS: usize = 4;

const CONTINUATION: u8 = 0x80;
const DIGIT_MASK: u8 = 0x7F;

/// Encode `len` as an MQTT remaining length.
///
/// Each output byte carries seven value bits, least significant group first;
/// the high bit is set on every byte except the last. The result is always
/// the shortest encoding.
///
/// # Errors
///
/// [`Error::Encoding`] if `len` exceeds [`MAX_REMAINING_LENGTH`].
///
/// # Examples
///
/// ```rust
/// use rtklink::network::application::mqtt::codec::encode_remaining_length;
///
/// assert_eq!(&encode_remaining_length(0).unwrap()[..], &[0x00]);
/// assert_eq!(&encode_remaining_length(128).unwrap()[..], &[0x80, 0x01]);
/// assert!(encode_remaining_length(268_435_456).is_err());
/// ```
pub fn encode_remaining_length(mut len: usize) -> Result<heapless::Vec<u8, MAX_LENGTH_DIGITS>> {
    if len > MAX_REMAINING_LENGTH {
        return Err(Error::Encoding(len));
    }

    let mut digits = heapless::Vec::new();
    loop {
        let mut digit = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            digit |= CONTINUATION;
        }
        // Range check above keeps us within four digits.
        digits.push(digit).map_err(|_| Error::Encoding(len))?;
        if len == 0 {
            return Ok(digits);
        }
    }
}

/// Decode a remaining length from the front of `buf`.
///
/// Returns `Ok(Some((value, digits_consumed)))`, or `Ok(None)` when `buf`
/// ends before the final digit.
///
/// # Errors
///
/// [`Error::Protocol`] if the fourth digit still has its continuation bit set.
pub fn decode_remaining_length(buf: &[u8]) -> Result<Option<(usize, usize)>> {
    let mut value = 0usize;
    let mut multiplier = 1usize;

    for (i, &digit) in buf.iter().take(MAX_LENGTH_DIGITS).enumerate() {
        value += (digit & DIGIT_MASK) as usize * multiplier;
        if digit & CONTINUATION == 0 {
            return Ok(Some((value, i + 1)));
        }
        multiplier *= 128;
    }

    if buf.len() >= MAX_LENGTH_DIGITS {
        Err(Error::Protocol("malformed remaining length"))
    } else {
        Ok(None)
    }
}

/// Append `field` with its two-byte big-endian length prefix.
///
/// `name` identifies the field in the error when it is too long.
pub fn write_field(buf: &mut Vec<u8>, name: &'static str, field: &[u8]) -> Result<()> {
    if field.len() > MAX_FIELD_LEN {
        return Err(Error::SizeLimit {
            field: name,
            len: field.len(),
            max: MAX_FIELD_LEN,
        });
    }
    buf.extend_from_slice(&(field.len() as u16).to_be_bytes());
    buf.extend_from_slice(field);
    Ok(())
}

/// Read a length-prefixed field from the front of `buf`.
///
/// Returns the field bytes and the total number of bytes consumed.
pub fn read_field(buf: &[u8]) -> Result<(&[u8], usize)> {
    let len = read_u16(buf)? as usize;
    let field = buf
        .get(2..2 + len)
        .ok_or(Error::Protocol("length-prefixed field overruns packet"))?;
    Ok((field, 2 + len))
}

/// Read a big-endian `u16` from the front of `buf`.
pub fn read_u16(buf: &[u8]) -> Result<u16> {
    match buf {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(Error::Protocol("truncated two-byte integer")),
    }
}
