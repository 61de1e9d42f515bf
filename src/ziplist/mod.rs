pub mod error;
pub mod iter;
pub mod lib;
pub mod ziplist;

/// zlbytes(u32) zltail(u32) zllen(u16)
pub const ZIPLIST_BYTES_SIZE: usize = 4;
pub const ZIPLIST_TAIL_SIZE: usize = 4;
pub const ZIPLIST_LEN_SIZE: usize = 2;
pub const ZIPLIST_HEADER_SIZE: usize = ZIPLIST_BYTES_SIZE + ZIPLIST_TAIL_SIZE + ZIPLIST_LEN_SIZE;
pub const ZIPLIST_END_SIZE: usize = 1;
const ZIPLIST_TAIL_OFFSET: usize = ZIPLIST_BYTES_SIZE;
const ZIPLIST_LENGTH_OFFSET: usize = ZIPLIST_BYTES_SIZE + ZIPLIST_TAIL_SIZE;

pub const ZIP_END: u8 = 255;
pub const ZIP_BIG_PREVLEN: u8 = 254;

/// Header count value meaning "scan to find out".
pub const ZIPLIST_LEN_UNKNOWN: u16 = u16::MAX;

/// prevlen(5) + encoding(5) + one payload byte
const ZIP_MAX_HEADER_SIZE: usize = 11;

pub const ZIPLIST_HEAD: i64 = 0;
pub const ZIPLIST_TAIL: i64 = -1;

pub const ZIP_STR_MASK: u8 = 0xc0;
pub const ZIP_INT_MASK: u8 = 0x30;

/// string encode
pub const ZIP_STR_06B: u8 = 0 << 6;
pub const ZIP_STR_14B: u8 = 1 << 6;
pub const ZIP_STR_32B: u8 = 2 << 6;

/// integer encode
pub const ZIP_INT_16B: u8 = 0xc0 | (0 << 4);
pub const ZIP_INT_32B: u8 = 0xc0 | (1 << 4);
pub const ZIP_INT_64B: u8 = 0xc0 | (2 << 4);
pub const ZIP_INT_24B: u8 = 0xc0 | (3 << 4);
pub const ZIP_INT_8B: u8 = 0xfe;

/// 4 bit immediate |1111xxxx|, xxxx in 0001..=1101, value is xxxx - 1
pub const ZIP_INT_IMM_MIN: u8 = 0xf1; /* 11110001 */
pub const ZIP_INT_IMM_MAX: u8 = 0xfd; /* 11111101 */
const ZIP_INT_IMM_MASK: u8 = 0x0f;

const ZIP_STR_06B_MAX: usize = 0x3f;
const ZIP_STR_14B_MAX: usize = 0x3fff;

/// Strings this long or longer are never tried as integers.
const LONG_STR_SIZE: usize = 32;

const INT_24_MAX: i64 = 0x7fffff;
const INT_24_MIN: i64 = -INT_24_MAX - 1;

/// Upper bound for a single zip list, callers convert to another encoding past it.
pub const SIZE_SAFETY_LIMIT: usize = 1 << 30;
