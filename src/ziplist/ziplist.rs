use std::fmt::Write as _;

use tracing::{debug, trace, warn};

use crate::ziplist::error::ZipListError;
use crate::ziplist::lib::{
    decode_length, decode_prev_len, decode_prev_len_size, encoding_len_size, entry_encoding,
    int_size, is_str, load_integer, prev_len_byte_diff, read_u32, save_integer,
    store_entry_encoding, store_prev_entry_length, store_prev_entry_length_large, try_encoding,
    write_u32,
};
use crate::ziplist::*;

/// A decoded entry header. Plain data, it does not borrow the list and goes
/// stale as soon as the list is mutated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZlEntry {
    /// length of prev entry length info
    pub prev_raw_len_size: usize,
    /// prev entry length
    pub prev_raw_len: usize,
    /// length of cur entry length info
    pub len_size: usize,
    /// cur entry payload length
    pub len: usize,
    /// prev_raw_len_size + len_size
    pub head_size: usize,
    /// cur entry data encode
    pub encoding: u8,
    /// offset of the entry inside the list
    pub pos: usize,
}

impl ZlEntry {
    #[inline]
    pub fn raw_len(&self) -> usize {
        self.head_size + self.len
    }

    #[inline]
    pub fn payload_offset(&self) -> usize {
        self.pos + self.head_size
    }
}

/// Borrowed entry payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZipListValue<'a> {
    Str(&'a [u8]),
    Int(i64),
}

/// Owned entry payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ZipListEntry {
    Str(Vec<u8>),
    Int(i64),
}

impl ZipListValue<'_> {
    pub fn to_entry(&self) -> ZipListEntry {
        match *self {
            ZipListValue::Str(s) => ZipListEntry::Str(s.to_vec()),
            ZipListValue::Int(v) => ZipListEntry::Int(v),
        }
    }

    /// The bytes a caller would have inserted to produce this entry.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            ZipListValue::Str(s) => s.to_vec(),
            ZipListValue::Int(v) => v.to_string().into_bytes(),
        }
    }
}

impl ZipListEntry {
    pub fn as_value(&self) -> ZipListValue<'_> {
        match self {
            ZipListEntry::Str(s) => ZipListValue::Str(s),
            ZipListEntry::Int(v) => ZipListValue::Int(*v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZipList {
    pub(crate) data: Vec<u8>,
    safety_limit: usize,
}

impl Default for ZipList {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipList {
    pub fn new() -> Self {
        Self::with_safety_limit(SIZE_SAFETY_LIMIT)
    }

    pub fn with_safety_limit(safety_limit: usize) -> Self {
        let bytes = ZIPLIST_HEADER_SIZE + ZIPLIST_END_SIZE;
        let mut zl = Self {
            data: vec![0u8; bytes],
            safety_limit,
        };
        zl.set_total_bytes(bytes);
        zl.set_tail_offset(ZIPLIST_HEADER_SIZE);
        zl.set_header_len(0);
        zl.data[bytes - 1] = ZIP_END;
        zl
    }

    /// Adopts an encoded buffer, e.g. one read from the wire. The header is
    /// always checked; `deep` also walks and checks every entry.
    pub fn from_bytes(data: Vec<u8>, deep: bool) -> Result<Self, ZipListError> {
        if data.len() < ZIPLIST_HEADER_SIZE + ZIPLIST_END_SIZE {
            return Err(ZipListError::corrupt(0, "buffer shorter than header"));
        }
        if read_u32(&data, 0) as usize != data.len() {
            return Err(ZipListError::corrupt(0, "total bytes does not match buffer"));
        }
        let zl = Self {
            data,
            safety_limit: SIZE_SAFETY_LIMIT,
        };
        zl.validate_integrity(deep, None)
            .inspect_err(|e| warn!("zip list rejected: {e}"))?;
        Ok(zl)
    }

    pub fn set_safety_limit(&mut self, safety_limit: usize) {
        self.safety_limit = safety_limit;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn blob_len(&self) -> usize {
        self.total_bytes()
    }

    #[inline]
    pub fn total_bytes(&self) -> usize {
        read_u32(&self.data, 0) as usize
    }

    #[inline]
    fn set_total_bytes(&mut self, bytes: usize) {
        write_u32(&mut self.data, 0, bytes as u32);
    }

    #[inline]
    pub fn tail_offset(&self) -> usize {
        read_u32(&self.data, ZIPLIST_TAIL_OFFSET) as usize
    }

    #[inline]
    fn set_tail_offset(&mut self, offset: usize) {
        write_u32(&mut self.data, ZIPLIST_TAIL_OFFSET, offset as u32);
    }

    /// Raw count field, `ZIPLIST_LEN_UNKNOWN` once saturated.
    #[inline]
    pub fn header_len(&self) -> u16 {
        u16::from_le_bytes([
            self.data[ZIPLIST_LENGTH_OFFSET],
            self.data[ZIPLIST_LENGTH_OFFSET + 1],
        ])
    }

    #[inline]
    fn set_header_len(&mut self, len: u16) {
        self.data[ZIPLIST_LENGTH_OFFSET..ZIPLIST_LENGTH_OFFSET + ZIPLIST_LEN_SIZE]
            .copy_from_slice(&len.to_le_bytes());
    }

    #[inline]
    pub fn head_offset(&self) -> usize {
        ZIPLIST_HEADER_SIZE
    }

    /// Offset of the sentinel byte.
    #[inline]
    pub fn end_offset(&self) -> usize {
        self.total_bytes() - ZIPLIST_END_SIZE
    }

    /// Whether `pos` is the sentinel. Offsets outside the buffer are not.
    #[inline]
    pub fn is_end(&self, pos: usize) -> bool {
        self.data.get(pos) == Some(&ZIP_END)
    }

    /// Rejects offsets before the first entry or past the sentinel.
    #[inline]
    fn check_pos(&self, pos: usize) -> Result<(), ZipListError> {
        if self.out_of_range(pos) {
            return Err(ZipListError::corrupt(pos, "offset outside the list"));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.is_end(self.head_offset())
    }

    fn incr_len(&mut self, incr: usize) {
        let len = self.header_len();
        if len < ZIPLIST_LEN_UNKNOWN {
            let new_len = (len as usize + incr).min(ZIPLIST_LEN_UNKNOWN as usize) as u16;
            if new_len == ZIPLIST_LEN_UNKNOWN {
                warn!("zip list count saturated, length now needs a full scan");
            }
            self.set_header_len(new_len);
        }
    }

    fn decr_len(&mut self, delta: usize) {
        let len = self.header_len();
        if len < ZIPLIST_LEN_UNKNOWN && len as usize >= delta {
            self.set_header_len(len - delta as u16);
        }
    }

    /// Walks every entry and counts them, ignoring the header count.
    pub fn count_entries(&self) -> Result<usize, ZipListError> {
        let mut count = 0;
        let mut p = self.head_offset();
        while !self.is_end(p) {
            p += self.raw_entry_length_safe(p)?;
            count += 1;
        }
        Ok(count)
    }

    /// Number of entries. Rescans once the header count has saturated and
    /// writes the result back when it fits again.
    pub fn entry_num(&mut self) -> Result<usize, ZipListError> {
        let len = self.header_len();
        if len < ZIPLIST_LEN_UNKNOWN {
            return Ok(len as usize);
        }
        let count = self.count_entries()?;
        if count < ZIPLIST_LEN_UNKNOWN as usize {
            self.set_header_len(count as u16);
        }
        Ok(count)
    }

    /// Whether growing by `add` bytes keeps the list under its safety limit.
    pub fn safe_to_add(&self, add: usize) -> bool {
        self.total_bytes() + add <= self.safety_limit
    }

    /// Resizes the buffer, rewriting total bytes and the sentinel.
    fn resize(&mut self, len: usize) -> Result<(), ZipListError> {
        if len > u32::MAX as usize {
            return Err(ZipListError::TooLarge(len));
        }
        if len > self.data.len() {
            self.data
                .try_reserve(len - self.data.len())
                .map_err(|_| ZipListError::Alloc(len))?;
        }
        self.data.resize(len, 0);
        self.set_total_bytes(len);
        self.data[len - 1] = ZIP_END;
        Ok(())
    }

    #[inline]
    fn out_of_range(&self, pos: usize) -> bool {
        pos < self.head_offset() || pos > self.end_offset()
    }

    /// Bounds-checked decode of the entry at `pos`. Every offset that did not
    /// come from a previous checked call goes through here.
    pub fn entry_safe(&self, pos: usize, validate_prev: bool) -> Result<ZlEntry, ZipListError> {
        let head = self.head_offset();
        let end = self.end_offset();

        // A worst case header cannot run past the end: decode, then check the payload.
        if pos >= head && pos + ZIP_MAX_HEADER_SIZE < end {
            let (prev_raw_len_size, prev_raw_len) = decode_prev_len(&self.data[pos..]);
            let enc = &self.data[pos + prev_raw_len_size..];
            let encoding = entry_encoding(enc);
            let (len_size, len) = decode_length(enc, encoding)
                .map_err(|_| ZipListError::corrupt(pos, "unknown encoding"))?;
            let e = ZlEntry {
                prev_raw_len_size,
                prev_raw_len,
                len_size,
                len,
                head_size: prev_raw_len_size + len_size,
                encoding,
                pos,
            };
            if self.out_of_range(pos.saturating_add(e.raw_len())) {
                return Err(ZipListError::corrupt(pos, "payload runs past the end"));
            }
            if validate_prev && pos - head < prev_raw_len {
                return Err(ZipListError::corrupt(pos, "prev length runs before the head"));
            }
            return Ok(e);
        }

        // Near the edges every field is checked before it is read.
        if self.out_of_range(pos) {
            return Err(ZipListError::corrupt(pos, "entry outside the list"));
        }
        let prev_raw_len_size = decode_prev_len_size(self.data[pos]);
        let enc_pos = pos + prev_raw_len_size;
        if self.out_of_range(enc_pos) {
            return Err(ZipListError::corrupt(pos, "prev length field runs past the end"));
        }
        let encoding = entry_encoding(&self.data[enc_pos..]);
        let len_size = encoding_len_size(encoding)
            .ok_or_else(|| ZipListError::corrupt(pos, "unknown encoding"))?;
        if self.out_of_range(enc_pos + len_size) {
            return Err(ZipListError::corrupt(pos, "encoding field runs past the end"));
        }

        let (_, prev_raw_len) = decode_prev_len(&self.data[pos..]);
        let (len_size, len) = decode_length(&self.data[enc_pos..], encoding)
            .map_err(|_| ZipListError::corrupt(pos, "unknown encoding"))?;
        let e = ZlEntry {
            prev_raw_len_size,
            prev_raw_len,
            len_size,
            len,
            head_size: prev_raw_len_size + len_size,
            encoding,
            pos,
        };
        if self.out_of_range(pos.saturating_add(e.raw_len())) {
            return Err(ZipListError::corrupt(pos, "payload runs past the end"));
        }
        if validate_prev && pos - head < prev_raw_len {
            return Err(ZipListError::corrupt(pos, "prev length runs before the head"));
        }
        Ok(e)
    }

    /// Decodes an entry trusting its header fields.
    ///
    /// `pos` must have been produced by `entry_safe` (directly or through
    /// `index`/`next`/`prev`/`find`) since the last mutation, or be an entry
    /// this list just wrote itself.
    pub fn zip_entry(&self, pos: usize) -> Result<ZlEntry, ZipListError> {
        self.check_pos(pos)?;
        if self.is_end(pos) {
            return Err(ZipListError::corrupt(pos, "sentinel is not an entry"));
        }
        let (prev_raw_len_size, prev_raw_len) = decode_prev_len(&self.data[pos..]);
        let enc = &self.data[pos + prev_raw_len_size..];
        let encoding = entry_encoding(enc);
        let (len_size, len) = decode_length(enc, encoding)?;
        Ok(ZlEntry {
            prev_raw_len_size,
            prev_raw_len,
            len_size,
            len,
            head_size: prev_raw_len_size + len_size,
            encoding,
            pos,
        })
    }

    /// Entry length trusting the header but checking that the payload stays inside the list.
    fn raw_entry_length(&self, pos: usize) -> Result<usize, ZipListError> {
        let raw_len = self.zip_entry(pos)?.raw_len();
        if self.out_of_range(pos + raw_len) {
            return Err(ZipListError::corrupt(pos, "payload runs past the end"));
        }
        Ok(raw_len)
    }

    fn raw_entry_length_safe(&self, pos: usize) -> Result<usize, ZipListError> {
        Ok(self.entry_safe(pos, false)?.raw_len())
    }

    /// Offset of the entry after `pos`, `None` at or past the last entry.
    pub fn next(&self, pos: usize) -> Result<Option<usize>, ZipListError> {
        self.check_pos(pos)?;
        if self.is_end(pos) {
            return Ok(None);
        }
        let next = pos + self.raw_entry_length_safe(pos)?;
        if self.is_end(next) {
            return Ok(None);
        }
        self.entry_safe(next, true)?;
        Ok(Some(next))
    }

    /// Offset of the entry before `pos`, `None` at the head. From the
    /// sentinel it steps to the tail.
    pub fn prev(&self, pos: usize) -> Result<Option<usize>, ZipListError> {
        self.check_pos(pos)?;
        if self.is_end(pos) {
            let tail = self.tail_offset();
            if self.is_end(tail) {
                return Ok(None);
            }
            return Ok(Some(tail));
        }
        if pos == self.head_offset() {
            return Ok(None);
        }
        let prev_len = self.entry_safe(pos, true)?.prev_raw_len;
        if prev_len == 0 {
            return Err(ZipListError::corrupt(pos, "bad prev length"));
        }
        let prev = pos - prev_len;
        self.entry_safe(prev, true)?;
        Ok(Some(prev))
    }

    /// Offset of the entry at `index`; negative indices count from the tail
    /// with -1 the last entry.
    pub fn index(&self, index: i64) -> Result<Option<usize>, ZipListError> {
        let head = self.head_offset();
        let p = if index == ZIPLIST_HEAD {
            head
        } else if index == ZIPLIST_TAIL {
            self.tail_offset()
        } else if index < 0 {
            let mut remaining = (-(index + 1)) as u64;
            let mut p = self.tail_offset();
            if !self.is_end(p) {
                let (_, mut prev_len) = decode_prev_len(&self.data[p..]);
                while prev_len > 0 && remaining > 0 {
                    if prev_len > p - head {
                        return Err(ZipListError::corrupt(p, "bad prev length"));
                    }
                    p -= prev_len;
                    prev_len = decode_prev_len(&self.data[p..]).1;
                    remaining -= 1;
                }
            }
            if remaining > 0 {
                return Ok(None);
            }
            p
        } else {
            let mut remaining = index as u64;
            let mut p = head;
            while remaining > 0 && !self.is_end(p) {
                p += self.raw_entry_length(p)?;
                remaining -= 1;
            }
            if remaining > 0 {
                return Ok(None);
            }
            p
        };

        if self.is_end(p) {
            return Ok(None);
        }
        self.entry_safe(p, true)?;
        Ok(Some(p))
    }

    /// Payload of the entry at `pos`, `None` for the sentinel.
    pub fn get(&self, pos: usize) -> Result<Option<ZipListValue<'_>>, ZipListError> {
        self.check_pos(pos)?;
        if self.is_end(pos) {
            return Ok(None);
        }
        let e = self.entry_safe(pos, true)?;
        let payload = e.payload_offset();
        let value = if is_str(e.encoding) {
            ZipListValue::Str(&self.data[payload..payload + e.len])
        } else {
            ZipListValue::Int(load_integer(&self.data[payload..], e.encoding)?)
        };
        Ok(Some(value))
    }

    pub fn get_owned(&self, pos: usize) -> Result<Option<ZipListEntry>, ZipListError> {
        Ok(self.get(pos)?.map(|v| v.to_entry()))
    }

    /// Pushes `s` at the head or appends it at the tail.
    pub fn push(&mut self, s: impl AsRef<[u8]>, head: bool) -> Result<usize, ZipListError> {
        let pos = if head {
            self.head_offset()
        } else {
            self.end_offset()
        };
        self.insert(pos, s)
    }

    pub fn append(&mut self, s: impl AsRef<[u8]>) -> Result<usize, ZipListError> {
        self.push(s, false)
    }

    /// Inserts before the entry at `index`. `ZIPLIST_TAIL` and out of range
    /// indices append.
    pub fn insert_at(&mut self, index: i64, s: impl AsRef<[u8]>) -> Result<usize, ZipListError> {
        let pos = if index == ZIPLIST_TAIL {
            self.end_offset()
        } else {
            self.index(index)?.unwrap_or_else(|| self.end_offset())
        };
        self.insert(pos, s)
    }

    /// Inserts `s` before the entry at `pos` (or appends when `pos` is the
    /// sentinel). Returns the offset of the new entry.
    pub fn insert(&mut self, pos: usize, s: impl AsRef<[u8]>) -> Result<usize, ZipListError> {
        let s = s.as_ref();
        self.check_pos(pos)?;
        let cur_len = self.total_bytes();
        let at_end = self.is_end(pos);
        if !at_end {
            self.entry_safe(pos, true)?;
        }

        let mut prev_len = 0;
        if !at_end {
            prev_len = decode_prev_len(&self.data[pos..]).1;
        } else {
            let tail = self.tail_offset();
            if !self.is_end(tail) {
                prev_len = self.raw_entry_length_safe(tail)?;
            }
        }

        let (value, encoding) = try_encoding(s).unwrap_or((0, ZIP_STR_06B));
        let mut req_len = if is_str(encoding) {
            s.len()
        } else {
            int_size(encoding)?
        };
        req_len += store_prev_entry_length(None, prev_len);
        req_len += store_entry_encoding(None, encoding, s.len());

        // Keep a 5 byte prev length rather than shrink it for a tiny entry,
        // otherwise insert/delete can flip it back and forth.
        let mut force_large = false;
        let mut next_diff = if at_end {
            0
        } else {
            prev_len_byte_diff(&self.data[pos..], req_len)
        };
        if next_diff == -4 && req_len < 4 {
            next_diff = 0;
            force_large = true;
        }

        let grow = req_len + next_diff.max(0) as usize;
        if !self.safe_to_add(grow) {
            return Err(ZipListError::TooLarge(cur_len + grow));
        }

        let new_len = (cur_len + req_len).wrapping_add_signed(next_diff);
        self.resize(new_len)?;

        if !at_end {
            let next = pos + req_len;
            let src = pos.wrapping_add_signed(-next_diff);
            self.data.copy_within(src..cur_len - ZIPLIST_END_SIZE, next);

            if force_large {
                store_prev_entry_length_large(Some(&mut self.data[next..]), req_len);
            } else {
                store_prev_entry_length(Some(&mut self.data[next..]), req_len);
            }

            self.set_tail_offset(self.tail_offset() + req_len);
            let tail = self.entry_safe(next, true)?;
            if !self.is_end(next + tail.raw_len()) {
                self.set_tail_offset(self.tail_offset().wrapping_add_signed(next_diff));
            }
        } else {
            self.set_tail_offset(pos);
        }

        if next_diff != 0 {
            self.cascade_update(pos + req_len)?;
        }

        let mut p = pos;
        p += store_prev_entry_length(Some(&mut self.data[p..]), prev_len);
        p += store_entry_encoding(Some(&mut self.data[p..]), encoding, s.len());
        if is_str(encoding) {
            self.data[p..p + s.len()].copy_from_slice(s);
        } else {
            save_integer(&mut self.data[p..], value, encoding)?;
        }
        self.incr_len(1);
        trace!(pos, req_len, next_diff, "zip list insert");
        Ok(pos)
    }

    /// Propagates a length change of the entry at `pos` to the prev-length
    /// fields after it.
    ///
    /// The first pass only reads: it finds how many entries need their
    /// prev-length field widened from 1 to 5 bytes. The buffer is then grown
    /// once, the untouched remainder shifted once, and the affected entries
    /// are moved into place from the last one back to the first.
    fn cascade_update(&mut self, pos: usize) -> Result<(), ZipListError> {
        const DELTA: usize = 4;

        if self.is_end(pos) {
            return Ok(());
        }
        let cur_len = self.total_bytes();
        let tail = self.tail_offset();

        let first_entry_len = self.zip_entry(pos)?.raw_len();
        let mut prev_raw_len = first_entry_len;
        let mut prev_raw_len_size = store_prev_entry_length(None, prev_raw_len);
        let mut prev_offset = pos;
        let mut p = pos + prev_raw_len;
        let mut extra = 0;
        let mut cnt = 0;

        while !self.is_end(p) {
            let cur = self.entry_safe(p, false)?;

            if cur.prev_raw_len == prev_raw_len {
                break;
            }

            // The field is wide enough, only the value changes.
            if cur.prev_raw_len_size >= prev_raw_len_size {
                if cur.prev_raw_len_size == prev_raw_len_size {
                    store_prev_entry_length(Some(&mut self.data[p..]), prev_raw_len);
                } else {
                    store_prev_entry_length_large(Some(&mut self.data[p..]), prev_raw_len);
                }
                break;
            }

            if !(cur.prev_raw_len == 0 || cur.prev_raw_len + DELTA == prev_raw_len) {
                return Err(ZipListError::corrupt(p, "prev length out of step during cascade"));
            }

            let raw_len = cur.raw_len();
            prev_raw_len = raw_len + DELTA;
            prev_raw_len_size = store_prev_entry_length(None, prev_raw_len);
            prev_offset = p;
            p += raw_len;
            extra += DELTA;
            cnt += 1;
        }

        if extra == 0 {
            return Ok(());
        }

        if tail == prev_offset {
            // The tail itself grew, only the entries before it push it forward.
            if extra - DELTA != 0 {
                self.set_tail_offset(tail + extra - DELTA);
            }
        } else {
            self.set_tail_offset(tail + extra);
        }

        let offset = p;
        self.resize(cur_len + extra)?;
        self.data
            .copy_within(offset..cur_len - ZIPLIST_END_SIZE, offset + extra);
        let mut p = offset + extra;

        for _ in 0..cnt {
            let cur = self.zip_entry(prev_offset)?;
            let body = cur.raw_len() - cur.prev_raw_len_size;
            self.data.copy_within(
                prev_offset + cur.prev_raw_len_size..prev_offset + cur.raw_len(),
                p - body,
            );
            p -= body + 5;
            let new_prev_len = if cur.prev_raw_len == 0 {
                first_entry_len
            } else {
                cur.prev_raw_len + DELTA
            };
            store_prev_entry_length(Some(&mut self.data[p..]), new_prev_len);
            prev_offset = prev_offset.saturating_sub(cur.prev_raw_len);
        }

        debug!(entries = cnt, extra, "zip list cascade update");
        Ok(())
    }

    /// Removes up to `num` entries starting at `pos`.
    pub fn delete_entries(&mut self, pos: usize, num: usize) -> Result<usize, ZipListError> {
        let zl_bytes = self.total_bytes();
        self.check_pos(pos)?;
        if self.is_end(pos) {
            return Ok(0);
        }
        let first = self.entry_safe(pos, true)?;

        let mut p = pos;
        let mut deleted = 0;
        while !self.is_end(p) && deleted < num {
            p += self.raw_entry_length_safe(p)?;
            deleted += 1;
        }

        let total_len = p - first.pos;
        if total_len == 0 {
            return Ok(0);
        }

        let mut next_diff = 0;
        let set_tail;
        if !self.is_end(p) {
            // The successor now follows whatever preceded the first deleted entry.
            next_diff = prev_len_byte_diff(&self.data[p..], first.prev_raw_len);
            p = p.wrapping_add_signed(-next_diff);
            if p < first.pos || p >= self.end_offset() {
                return Err(ZipListError::corrupt(p, "successor moved outside the list"));
            }
            store_prev_entry_length(Some(&mut self.data[p..]), first.prev_raw_len);

            let mut tail = self.tail_offset() - total_len;
            let next = self.entry_safe(p, true)?;
            if !self.is_end(p + next.raw_len()) {
                tail = tail.wrapping_add_signed(next_diff);
            }
            set_tail = tail;

            self.data
                .copy_within(p..zl_bytes - ZIPLIST_END_SIZE, first.pos);
        } else {
            // Deleted through the tail, the entry before the hole is the new tail.
            set_tail = first.pos - first.prev_raw_len;
        }

        let new_len = (zl_bytes - total_len).wrapping_add_signed(next_diff);
        self.resize(new_len)?;
        self.decr_len(deleted);
        if set_tail > new_len - ZIPLIST_END_SIZE {
            return Err(ZipListError::corrupt(set_tail, "tail past the end"));
        }
        self.set_tail_offset(set_tail);

        if next_diff != 0 {
            self.cascade_update(first.pos)?;
        }
        trace!(pos, deleted, total_len, "zip list delete");
        Ok(deleted)
    }

    /// Deletes the entry at `*pos`. Afterwards `*pos` is the entry that took
    /// its place, or the sentinel.
    pub fn delete(&mut self, pos: &mut usize) -> Result<(), ZipListError> {
        let offset = *pos;
        self.delete_entries(offset, 1)?;
        *pos = offset;
        Ok(())
    }

    /// Deletes `num` entries starting at the signed `index`.
    pub fn delete_range(&mut self, index: i64, num: usize) -> Result<usize, ZipListError> {
        match self.index(index)? {
            Some(pos) => self.delete_entries(pos, num),
            None => Ok(0),
        }
    }

    /// Replaces the entry at `pos`, in place when the encoded size is unchanged.
    /// Returns the offset of the replacement.
    pub fn replace(&mut self, pos: usize, s: impl AsRef<[u8]>) -> Result<usize, ZipListError> {
        let s = s.as_ref();
        let entry = self.entry_safe(pos, true)?;

        let (value, encoding) = try_encoding(s).unwrap_or((0, ZIP_STR_06B));
        let mut req_len = if is_str(encoding) {
            s.len()
        } else {
            int_size(encoding)?
        };
        req_len += store_entry_encoding(None, encoding, s.len());

        if req_len == entry.len_size + entry.len {
            let mut p = pos + entry.prev_raw_len_size;
            p += store_entry_encoding(Some(&mut self.data[p..]), encoding, s.len());
            if is_str(encoding) {
                self.data[p..p + s.len()].copy_from_slice(s);
            } else {
                save_integer(&mut self.data[p..], value, encoding)?;
            }
            return Ok(pos);
        }

        let mut p = pos;
        self.delete(&mut p)?;
        self.insert(p, s)
    }

    /// Whether the entry at `pos` holds the same value as `s`.
    pub fn compare(&self, pos: usize, s: impl AsRef<[u8]>) -> Result<bool, ZipListError> {
        let s = s.as_ref();
        self.check_pos(pos)?;
        if self.is_end(pos) {
            return Ok(false);
        }
        let e = self.entry_safe(pos, true)?;
        let payload = e.payload_offset();
        if is_str(e.encoding) {
            return Ok(e.len == s.len() && &self.data[payload..payload + e.len] == s);
        }
        match try_encoding(s) {
            Some((value, _)) => Ok(load_integer(&self.data[payload..], e.encoding)? == value),
            None => Ok(false),
        }
    }

    /// First entry equal to `s`, comparing only every `skip + 1`-th entry.
    pub fn find(&self, s: impl AsRef<[u8]>, skip: usize) -> Result<Option<usize>, ZipListError> {
        self.find_from(self.head_offset(), s, skip)
    }

    /// Same as `find`, starting at the entry `pos`.
    pub fn find_from(
        &self,
        pos: usize,
        s: impl AsRef<[u8]>,
        skip: usize,
    ) -> Result<Option<usize>, ZipListError> {
        let s = s.as_ref();
        self.check_pos(pos)?;
        let mut skip_cnt = 0;
        // parsed on the first integer entry only
        let mut target: Option<Option<i64>> = None;
        let mut p = pos;

        while !self.is_end(p) {
            let e = self.entry_safe(p, true)?;
            let q = e.payload_offset();

            if skip_cnt == 0 {
                if is_str(e.encoding) {
                    if e.len == s.len() && &self.data[q..q + e.len] == s {
                        return Ok(Some(p));
                    }
                } else if let Some(value) =
                    *target.get_or_insert_with(|| try_encoding(s).map(|(v, _)| v))
                {
                    if load_integer(&self.data[q..], e.encoding)? == value {
                        return Ok(Some(p));
                    }
                }
                skip_cnt = skip;
            } else {
                skip_cnt -= 1;
            }
            p = q + e.len;
        }
        Ok(None)
    }

    /// Checks the header and, with `deep`, every entry. `entry_cb` sees each
    /// entry offset and may reject it.
    pub fn validate_integrity(
        &self,
        deep: bool,
        mut entry_cb: Option<&mut dyn FnMut(usize) -> bool>,
    ) -> Result<(), ZipListError> {
        let bytes = self.data.len();
        if bytes < ZIPLIST_HEADER_SIZE + ZIPLIST_END_SIZE {
            return Err(ZipListError::corrupt(0, "buffer shorter than header"));
        }
        if self.total_bytes() != bytes {
            return Err(ZipListError::corrupt(0, "total bytes does not match buffer"));
        }
        if self.data[bytes - 1] != ZIP_END {
            return Err(ZipListError::corrupt(bytes - 1, "missing end marker"));
        }
        let tail = self.tail_offset();
        if tail < self.head_offset() || tail > self.end_offset() {
            return Err(ZipListError::corrupt(tail, "tail offset outside the list"));
        }
        if !deep {
            return Ok(());
        }

        let mut count = 0usize;
        let mut prev_raw_len = 0;
        let mut last = self.head_offset();
        let mut p = self.head_offset();
        while !self.is_end(p) {
            let e = self.entry_safe(p, true)?;
            if e.prev_raw_len != prev_raw_len {
                warn!(pos = p, "zip list prev length mismatch");
                return Err(ZipListError::corrupt(p, "prev length does not match previous entry"));
            }
            if let Some(cb) = entry_cb.as_deref_mut() {
                if !cb(p) {
                    return Err(ZipListError::corrupt(p, "entry rejected"));
                }
            }
            prev_raw_len = e.raw_len();
            last = p;
            p += e.raw_len();
            count += 1;
        }

        if p != self.end_offset() {
            return Err(ZipListError::corrupt(p, "end marker before the end"));
        }
        if last != tail {
            return Err(ZipListError::corrupt(tail, "tail offset does not match last entry"));
        }
        let header_len = self.header_len();
        if header_len != ZIPLIST_LEN_UNKNOWN && header_len as usize != count {
            return Err(ZipListError::corrupt(0, "entry count does not match header"));
        }
        Ok(())
    }

    /// Appends every entry of `second` to `first`.
    pub fn merge(mut first: ZipList, second: ZipList) -> Result<ZipList, ZipListError> {
        if second.is_empty() {
            return Ok(first);
        }
        if first.is_empty() {
            return Ok(second);
        }

        let first_bytes = first.total_bytes();
        let second_bytes = second.total_bytes();
        let first_tail = first.tail_offset();
        let second_tail = second.tail_offset();
        let len = first.header_len() as usize + second.header_len() as usize;
        let total = first_bytes + second_bytes - ZIPLIST_HEADER_SIZE - ZIPLIST_END_SIZE;
        let safety_limit = first.safety_limit.max(second.safety_limit);
        if total > safety_limit {
            return Err(ZipListError::TooLarge(total));
        }

        first.resize(total)?;
        first.data[first_bytes - ZIPLIST_END_SIZE..]
            .copy_from_slice(&second.data[ZIPLIST_HEADER_SIZE..second_bytes]);
        first.set_tail_offset(first_bytes - ZIPLIST_END_SIZE + second_tail - ZIPLIST_HEADER_SIZE);
        first.set_header_len(len.min(ZIPLIST_LEN_UNKNOWN as usize) as u16);
        first.safety_limit = safety_limit;

        // The head of `second` still says it has no predecessor.
        first.cascade_update(first_tail)?;
        Ok(first)
    }

    /// Human readable dump of the header and every entry, also logged at debug level.
    pub fn repr(&self) -> Result<String, ZipListError> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{{total bytes {}}} {{num entries {}}}\n{{tail offset {}}}",
            self.total_bytes(),
            self.header_len(),
            self.tail_offset()
        );

        let mut p = self.head_offset();
        let mut index = 0;
        while !self.is_end(p) {
            let e = self.entry_safe(p, true)?;
            let _ = writeln!(
                out,
                "{{\n\tindex {index}, offset {p}, hdr+entry len {}, hdr len {}, prevrawlen {}, prevrawlensize {}, payload {}",
                e.raw_len(),
                e.head_size,
                e.prev_raw_len,
                e.prev_raw_len_size,
                e.len
            );
            let _ = write!(out, "\tbytes: ");
            for b in &self.data[p..p + e.head_size] {
                let _ = write!(out, "{b:02x}|");
            }
            let _ = writeln!(out);
            match self.get(p)? {
                Some(ZipListValue::Str(s)) => {
                    let shown = &s[..s.len().min(40)];
                    let ellipsis = if s.len() > 40 { "..." } else { "" };
                    let _ = writeln!(out, "\t[str]{}{ellipsis}", String::from_utf8_lossy(shown));
                }
                Some(ZipListValue::Int(v)) => {
                    let _ = writeln!(out, "\t[int]{v}");
                }
                None => {}
            }
            let _ = writeln!(out, "}}");
            p += e.raw_len();
            index += 1;
        }
        let _ = writeln!(out, "{{end}}");
        debug!("\n{out}");
        Ok(out)
    }
}
