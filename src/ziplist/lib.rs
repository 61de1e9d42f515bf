use crate::util::string_to_i64;
use crate::ziplist::error::ZipListError;
use crate::ziplist::*;

#[inline]
pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

#[inline]
pub(crate) fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn decode_prev_len_size(first: u8) -> usize {
    if first < ZIP_BIG_PREVLEN {
        1
    } else {
        5
    }
}

/// Returns `(prev_len_size, prev_len)` for the entry starting at `ptr[0]`.
pub fn decode_prev_len(ptr: &[u8]) -> (usize, usize) {
    let prev_len_size = decode_prev_len_size(ptr[0]);
    let prev_len = if prev_len_size == 1 {
        ptr[0] as usize
    } else {
        read_u32(ptr, 1) as usize
    };
    (prev_len_size, prev_len)
}

/// Encoding byte with the inline string length masked off.
#[inline]
pub fn entry_encoding(ptr: &[u8]) -> u8 {
    let mut encoding = ptr[0];
    if encoding < ZIP_STR_MASK {
        encoding &= ZIP_STR_MASK;
    }
    encoding
}

#[inline]
pub fn is_str(encoding: u8) -> bool {
    (encoding & ZIP_STR_MASK) < ZIP_STR_MASK
}

/// Width of the encoding field, `None` for a byte that is not an encoding.
#[inline]
pub fn encoding_len_size(encoding: u8) -> Option<usize> {
    match encoding {
        ZIP_INT_8B | ZIP_INT_16B | ZIP_INT_24B | ZIP_INT_32B | ZIP_INT_64B => Some(1),
        ZIP_INT_IMM_MIN..=ZIP_INT_IMM_MAX => Some(1),
        ZIP_STR_06B => Some(1),
        ZIP_STR_14B => Some(2),
        ZIP_STR_32B => Some(5),
        _ => None,
    }
}

/// Returns `(len_size, len)`: the width of the encoding field and the payload length.
pub fn decode_length(ptr: &[u8], encoding: u8) -> Result<(usize, usize), ZipListError> {
    match encoding {
        ZIP_STR_06B => Ok((1, (ptr[0] & 0x3f) as usize)),
        ZIP_STR_14B => {
            let len = (((ptr[0] & 0x3f) as usize) << 8) | (ptr[1] as usize);
            Ok((2, len))
        }
        ZIP_STR_32B => Ok((5, read_u32(ptr, 1) as usize)),
        _ => Ok((1, int_size(encoding)?)),
    }
}

pub fn int_size(encoding: u8) -> Result<usize, ZipListError> {
    match encoding {
        ZIP_INT_8B => Ok(1),
        ZIP_INT_16B => Ok(2),
        ZIP_INT_24B => Ok(3),
        ZIP_INT_32B => Ok(4),
        ZIP_INT_64B => Ok(8),
        ZIP_INT_IMM_MIN..=ZIP_INT_IMM_MAX => Ok(0),
        _ => Err(ZipListError::BadEncoding(encoding)),
    }
}

/// Writes the prev-length field if `p` is given; always returns its width.
pub fn store_prev_entry_length(p: Option<&mut [u8]>, len: usize) -> usize {
    if len < ZIP_BIG_PREVLEN as usize {
        if let Some(p) = p {
            p[0] = len as u8;
        }
        1
    } else {
        store_prev_entry_length_large(p, len)
    }
}

/// Always uses the 5 byte form, even for small lengths.
pub fn store_prev_entry_length_large(p: Option<&mut [u8]>, len: usize) -> usize {
    if let Some(p) = p {
        p[0] = ZIP_BIG_PREVLEN;
        write_u32(p, 1, len as u32);
    }
    5
}

/// Bytes the prev-length field at `p` must grow (or shrink) by to hold `len`.
pub fn prev_len_byte_diff(p: &[u8], len: usize) -> isize {
    let prev_len_size = decode_prev_len_size(p[0]);
    store_prev_entry_length(None, len) as isize - prev_len_size as isize
}

/// Writes the encoding field if `p` is given; always returns its width.
/// `raw_len` is only consulted for string encodings.
pub fn store_entry_encoding(p: Option<&mut [u8]>, encoding: u8, raw_len: usize) -> usize {
    if !is_str(encoding) {
        if let Some(p) = p {
            p[0] = encoding;
        }
        return 1;
    }

    if raw_len <= ZIP_STR_06B_MAX {
        if let Some(p) = p {
            p[0] = ZIP_STR_06B | raw_len as u8;
        }
        1
    } else if raw_len <= ZIP_STR_14B_MAX {
        if let Some(p) = p {
            p[0] = ZIP_STR_14B | ((raw_len >> 8) as u8 & 0x3f);
            p[1] = (raw_len & 0xff) as u8;
        }
        2
    } else {
        if let Some(p) = p {
            p[0] = ZIP_STR_32B;
            write_u32(p, 1, raw_len as u32);
        }
        5
    }
}

/// Picks the narrowest integer encoding for `entry`, `None` if it must stay a string.
pub fn try_encoding(entry: &[u8]) -> Option<(i64, u8)> {
    if entry.is_empty() || entry.len() >= LONG_STR_SIZE {
        return None;
    }
    let value = string_to_i64(entry).ok()?;
    let encoding = if (0..=12).contains(&value) {
        ZIP_INT_IMM_MIN + value as u8
    } else if (i8::MIN as i64..=i8::MAX as i64).contains(&value) {
        ZIP_INT_8B
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&value) {
        ZIP_INT_16B
    } else if (INT_24_MIN..=INT_24_MAX).contains(&value) {
        ZIP_INT_24B
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
        ZIP_INT_32B
    } else {
        ZIP_INT_64B
    };
    Some((value, encoding))
}

/// `p` must hold at least `int_size(encoding)` bytes.
pub fn save_integer(p: &mut [u8], value: i64, encoding: u8) -> Result<(), ZipListError> {
    match encoding {
        ZIP_INT_8B => p[0] = value as i8 as u8,
        ZIP_INT_16B => p[..2].copy_from_slice(&(value as i16).to_le_bytes()),
        ZIP_INT_24B => {
            let bytes = ((value as i32) << 8).to_le_bytes();
            p[..3].copy_from_slice(&bytes[1..]);
        }
        ZIP_INT_32B => p[..4].copy_from_slice(&(value as i32).to_le_bytes()),
        ZIP_INT_64B => p[..8].copy_from_slice(&value.to_le_bytes()),
        // stored in the encoding byte itself
        ZIP_INT_IMM_MIN..=ZIP_INT_IMM_MAX => {}
        _ => return Err(ZipListError::BadEncoding(encoding)),
    }
    Ok(())
}

pub fn load_integer(p: &[u8], encoding: u8) -> Result<i64, ZipListError> {
    let value = match encoding {
        ZIP_INT_8B => p[0] as i8 as i64,
        ZIP_INT_16B => i16::from_le_bytes([p[0], p[1]]) as i64,
        ZIP_INT_24B => (i32::from_le_bytes([0, p[0], p[1], p[2]]) >> 8) as i64,
        ZIP_INT_32B => i32::from_le_bytes([p[0], p[1], p[2], p[3]]) as i64,
        ZIP_INT_64B => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&p[..8]);
            i64::from_le_bytes(b)
        }
        ZIP_INT_IMM_MIN..=ZIP_INT_IMM_MAX => ((encoding & ZIP_INT_IMM_MASK) - 1) as i64,
        _ => return Err(ZipListError::BadEncoding(encoding)),
    };
    Ok(value)
}
