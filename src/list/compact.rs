use tracing::debug;

use crate::config::ZipListConfig;
use crate::list::List;
use crate::ziplist::error::ZipListError;
use crate::ziplist::ziplist::{ZipList, ZipListEntry, ZipListValue};

/// A list stored as a single zip list.
#[derive(Clone, Debug)]
pub struct CompactList {
    zl: ZipList,
    config: ZipListConfig,
}

impl Default for CompactList {
    fn default() -> Self {
        Self::new(ZipListConfig::default())
    }
}

impl CompactList {
    pub fn new(config: ZipListConfig) -> Self {
        Self {
            zl: ZipList::with_safety_limit(config.safety_limit),
            config,
        }
    }

    /// Adopts encoded bytes, validating them as configured.
    pub fn from_bytes(data: Vec<u8>, config: ZipListConfig) -> Result<Self, ZipListError> {
        let mut zl = ZipList::from_bytes(data, config.deep_validate)?;
        zl.set_safety_limit(config.safety_limit);
        Ok(Self { zl, config })
    }

    pub fn ziplist(&self) -> &ZipList {
        &self.zl
    }

    pub fn into_ziplist(self) -> ZipList {
        self.zl
    }

    /// Whether adding `value_len` more bytes would outgrow the configured limits.
    pub fn needs_conversion(&mut self, value_len: usize) -> Result<bool, ZipListError> {
        let entries = self.zl.entry_num()?;
        Ok(!self.config.fits(entries, value_len) || !self.zl.safe_to_add(value_len))
    }

    fn pos_of(&self, index: usize) -> Result<usize, ZipListError> {
        let index = i64::try_from(index).map_err(|_| ZipListError::OutOfRange(index))?;
        self.zl
            .index(index)?
            .ok_or(ZipListError::OutOfRange(index as usize))
    }

    fn value_at(&self, pos: usize) -> Result<ZipListEntry, ZipListError> {
        self.zl
            .get_owned(pos)?
            .ok_or(ZipListError::OutOfRange(pos))
    }
}

impl List for CompactList {
    fn add(&mut self, val: &[u8]) -> Result<(), ZipListError> {
        self.zl.append(val)?;
        Ok(())
    }

    fn get(&self, index: usize) -> Result<ZipListEntry, ZipListError> {
        let pos = self.pos_of(index)?;
        self.value_at(pos)
    }

    fn set(&mut self, index: usize, val: &[u8]) -> Result<(), ZipListError> {
        let pos = self.pos_of(index)?;
        self.zl.replace(pos, val)?;
        Ok(())
    }

    fn insert(&mut self, index: usize, val: &[u8]) -> Result<(), ZipListError> {
        let len = self.len()?;
        if index > len {
            return Err(ZipListError::OutOfRange(index));
        }
        let pos = if index == len {
            self.zl.end_offset()
        } else {
            self.pos_of(index)?
        };
        self.zl.insert(pos, val)?;
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<ZipListEntry, ZipListError> {
        let mut pos = self.pos_of(index)?;
        let value = self.value_at(pos)?;
        self.zl.delete(&mut pos)?;
        Ok(value)
    }

    fn remove_last(&mut self) -> Result<Option<ZipListEntry>, ZipListError> {
        let Some(mut pos) = self.zl.index(-1)? else {
            return Ok(None);
        };
        let value = self.value_at(pos)?;
        self.zl.delete(&mut pos)?;
        Ok(Some(value))
    }

    fn remove_all_by_val(&mut self, val: &[u8]) -> Result<usize, ZipListError> {
        self.remove_by_val(val, usize::MAX)
    }

    fn remove_by_val(&mut self, val: &[u8], count: usize) -> Result<usize, ZipListError> {
        let mut removed = 0;
        let mut pos = self.zl.find(val, 0)?;
        while let Some(mut p) = pos {
            if removed >= count {
                break;
            }
            self.zl.delete(&mut p)?;
            removed += 1;
            pos = self.zl.find_from(p, val, 0)?;
        }
        debug!(removed, "compact list remove by value");
        Ok(removed)
    }

    fn reverse_remove_by_val(&mut self, val: &[u8], count: usize) -> Result<usize, ZipListError> {
        let mut removed = 0;
        let mut pos = self.zl.index(-1)?;
        while let Some(p) = pos {
            if removed >= count {
                break;
            }
            // Deleting never moves the entries in front of `p`.
            let prev = self.zl.prev(p)?;
            if self.zl.compare(p, val)? {
                let mut p = p;
                self.zl.delete(&mut p)?;
                removed += 1;
            }
            pos = prev;
        }
        debug!(removed, "compact list reverse remove by value");
        Ok(removed)
    }

    fn len(&mut self) -> Result<usize, ZipListError> {
        self.zl.entry_num()
    }

    fn for_each<F>(&self, mut consumer: F) -> Result<(), ZipListError>
    where
        F: FnMut(usize, ZipListValue<'_>) -> bool,
    {
        for (i, value) in self.zl.values().enumerate() {
            if !consumer(i, value?) {
                break;
            }
        }
        Ok(())
    }

    fn contains(&self, val: &[u8]) -> Result<bool, ZipListError> {
        Ok(self.zl.find(val, 0)?.is_some())
    }

    fn range(&self, start: usize, stop: usize) -> Result<Vec<ZipListEntry>, ZipListError> {
        if start > stop {
            return Err(ZipListError::OutOfRange(start));
        }
        let mut out = Vec::new();
        if start == stop {
            return Ok(out);
        }
        let mut pos = Some(self.pos_of(start)?);
        while let Some(p) = pos {
            if out.len() == stop - start {
                break;
            }
            out.push(self.value_at(p)?);
            pos = self.zl.next(p)?;
        }
        if out.len() < stop - start {
            return Err(ZipListError::OutOfRange(stop));
        }
        Ok(out)
    }
}
