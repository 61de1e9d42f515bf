pub mod compact;
mod test;

use crate::ziplist::error::ZipListError;
use crate::ziplist::ziplist::{ZipListEntry, ZipListValue};

/// The ordered container interface shared by the list encodings.
///
/// Indices are zero based; `insert` at `len()` appends.
pub trait List {
    fn add(&mut self, val: &[u8]) -> Result<(), ZipListError>;
    fn get(&self, index: usize) -> Result<ZipListEntry, ZipListError>;
    fn set(&mut self, index: usize, val: &[u8]) -> Result<(), ZipListError>;
    fn insert(&mut self, index: usize, val: &[u8]) -> Result<(), ZipListError>;
    fn remove(&mut self, index: usize) -> Result<ZipListEntry, ZipListError>;
    fn remove_last(&mut self) -> Result<Option<ZipListEntry>, ZipListError>;
    fn remove_all_by_val(&mut self, val: &[u8]) -> Result<usize, ZipListError>;
    /// Removes the first `count` matches from the head.
    fn remove_by_val(&mut self, val: &[u8], count: usize) -> Result<usize, ZipListError>;
    /// Removes the first `count` matches from the tail.
    fn reverse_remove_by_val(&mut self, val: &[u8], count: usize) -> Result<usize, ZipListError>;
    fn len(&mut self) -> Result<usize, ZipListError>;
    /// Stops early when `consumer` returns false.
    fn for_each<F>(&self, consumer: F) -> Result<(), ZipListError>
    where
        F: FnMut(usize, ZipListValue<'_>) -> bool;
    fn contains(&self, val: &[u8]) -> Result<bool, ZipListError>;
    /// Entries in `[start, stop)`.
    fn range(&self, start: usize, stop: usize) -> Result<Vec<ZipListEntry>, ZipListError>;
}
