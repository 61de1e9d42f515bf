#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZipListError {
    #[error("[ZipList]Corrupt entry at {pos}: {reason}")]
    Corrupt { pos: usize, reason: &'static str },
    #[error("[ZipList]Unknown encoding byte {0:#04x}")]
    BadEncoding(u8),
    #[error("[ZipList]Position out of range({0})")]
    OutOfRange(usize),
    #[error("[ZipList]Allocation of {0} bytes failed")]
    Alloc(usize),
    #[error("[ZipList]Size {0} exceeds the zip list limit")]
    TooLarge(usize),
    #[error("A string of zero length or excessive length")]
    InValidString,
    #[error("FirstDigitError")]
    InvalidFirstDigit,
    #[error("InvalidChar")]
    InvalidChar,
    #[error("Mul overflow")]
    OverFlowMul,
    #[error("Add overflow")]
    OverFlowAdd,
    #[error("Negative overflow")]
    OverFlowNegative,
    #[error("Positive overflow")]
    OverFlowPositive,
}

impl ZipListError {
    pub(crate) fn corrupt(pos: usize, reason: &'static str) -> Self {
        ZipListError::Corrupt { pos, reason }
    }
}
