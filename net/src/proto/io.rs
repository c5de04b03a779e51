use super::{
    error::{ProtoError, Result},
    types::Uuid,
    varint::{read_varint, write_varint},
};

#[inline]
pub(crate) fn take<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if input.len() < len {
        return Err(ProtoError::TruncatedInput);
    }

    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

#[inline]
fn take_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(input, N)?);
    Ok(out)
}

#[inline]
pub(crate) fn read_u8(input: &mut &[u8]) -> Result<u8> {
    Ok(take(input, 1)?[0])
}

#[inline]
pub(crate) fn read_bool(input: &mut &[u8]) -> Result<bool> {
    match read_u8(input)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProtoError::InvalidBool(other)),
    }
}

#[inline]
pub(crate) fn write_bool(out: &mut Vec<u8>, value: bool) {
    out.push(value as u8);
}

#[inline]
pub(crate) fn read_u16_be(input: &mut &[u8]) -> Result<u16> {
    Ok(u16::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_i32_be(input: &mut &[u8]) -> Result<i32> {
    Ok(i32::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn read_i64_be(input: &mut &[u8]) -> Result<i64> {
    Ok(i64::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_i64_be(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_uuid(input: &mut &[u8]) -> Result<Uuid> {
    Ok(Uuid::from_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_uuid(out: &mut Vec<u8>, value: &Uuid) {
    out.extend_from_slice(value.as_bytes());
}

/// Varint length followed by that many raw bytes.
pub(crate) fn read_byte_array<'a>(input: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_varint(input)?;
    if len < 0 {
        return Err(ProtoError::NegativeLength(len));
    }
    take(input, len as usize)
}

pub(crate) fn read_string_bounded<'a>(input: &mut &'a [u8], max_chars: usize) -> Result<&'a str> {
    let byte_len = read_varint(input)?;
    if byte_len < 0 {
        return Err(ProtoError::NegativeLength(byte_len));
    }

    let byte_len = byte_len as usize;
    let max_bytes = max_chars.saturating_mul(4);
    if byte_len > max_bytes {
        return Err(ProtoError::LengthTooLarge {
            max: max_bytes,
            actual: byte_len,
        });
    }

    let bytes = take(input, byte_len)?;
    let s = std::str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)?;

    let char_count = s.encode_utf16().count();
    if char_count > max_chars {
        return Err(ProtoError::StringTooLong {
            max: max_chars,
            actual: char_count,
        });
    }

    Ok(s)
}

pub(crate) fn write_string_bounded(out: &mut Vec<u8>, value: &str, max_chars: usize) -> Result<()> {
    let char_count = value.encode_utf16().count();
    if char_count > max_chars {
        return Err(ProtoError::StringTooLong {
            max: max_chars,
            actual: char_count,
        });
    }

    let len = value.len();
    if len > i32::MAX as usize {
        return Err(ProtoError::LengthTooLarge {
            max: i32::MAX as usize,
            actual: len,
        });
    }

    write_varint(out, len as i32);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip_including_empty_and_multibyte() {
        for value in ["", "a", "play.example.com", "🌙 Server sleeping", "ßüñ"] {
            let mut buf = Vec::new();
            write_string_bounded(&mut buf, value, 32_767).unwrap();
            let mut slice = buf.as_slice();
            assert_eq!(read_string_bounded(&mut slice, 32_767).unwrap(), value);
            assert!(slice.is_empty());
        }
    }

    #[test]
    fn string_shorter_than_declared_is_truncated() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 5);
        buf.extend_from_slice(b"abc");
        let mut slice = buf.as_slice();
        assert_eq!(
            read_string_bounded(&mut slice, 255),
            Err(ProtoError::TruncatedInput)
        );
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let buf = [0x02, 0xc3, 0x28];
        let mut slice = &buf[..];
        assert_eq!(
            read_string_bounded(&mut slice, 255),
            Err(ProtoError::InvalidUtf8)
        );
    }

    #[test]
    fn string_over_bound_is_rejected_before_reading_body() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 100);
        let mut slice = buf.as_slice();
        assert_eq!(
            read_string_bounded(&mut slice, 16),
            Err(ProtoError::LengthTooLarge {
                max: 64,
                actual: 100
            })
        );
    }
}
