use crate::ziplist::error::ZipListError;

/// Parses a canonical decimal `i64`: optional `-`, no leading zeros (except a
/// bare `"0"`), nothing but digits, and within range.
pub fn string_to_i64(b: &[u8]) -> Result<i64, ZipListError> {
    if b.is_empty() {
        return Err(ZipListError::InValidString);
    }
    if b.len() == 1 && b[0] == b'0' {
        return Ok(0);
    }

    let (negative, digits) = match b[0] {
        b'-' => (true, &b[1..]),
        _ => (false, b),
    };

    let (first, rest) = match digits.split_first() {
        Some((first @ b'1'..=b'9', rest)) => (*first, rest),
        _ => return Err(ZipListError::InvalidFirstDigit),
    };

    let mut v = (first - b'0') as u64;
    for &c in rest {
        if !c.is_ascii_digit() {
            return Err(ZipListError::InvalidChar);
        }
        v = v.checked_mul(10).ok_or(ZipListError::OverFlowMul)?;
        v = v
            .checked_add((c - b'0') as u64)
            .ok_or(ZipListError::OverFlowAdd)?;
    }

    if negative {
        if v > i64::MAX as u64 + 1 {
            return Err(ZipListError::OverFlowNegative);
        }
        Ok((v as i64).wrapping_neg())
    } else {
        if v > i64::MAX as u64 {
            return Err(ZipListError::OverFlowPositive);
        }
        Ok(v as i64)
    }
}
