use crate::ziplist::error::ZipListError;
use crate::ziplist::ziplist::{ZipList, ZipListValue};

/// Entry offsets from head to tail. Stops after yielding an error.
pub struct ZipListIter<'a> {
    cur: Option<usize>,
    started: bool,
    ziplist: &'a ZipList,
}

/// Entry offsets from tail to head.
pub struct ZipListRevIter<'a> {
    cur: Option<usize>,
    started: bool,
    ziplist: &'a ZipList,
}

/// Decoded values from head to tail.
pub struct ZipListValues<'a> {
    inner: ZipListIter<'a>,
}

/// Field/value offset pairs, for lists used as small hashes.
pub struct HashTypeIter<'a> {
    inner: ZipListIter<'a>,
}

impl ZipList {
    pub fn iter(&self) -> ZipListIter<'_> {
        ZipListIter {
            cur: None,
            started: false,
            ziplist: self,
        }
    }

    pub fn rev_iter(&self) -> ZipListRevIter<'_> {
        ZipListRevIter {
            cur: None,
            started: false,
            ziplist: self,
        }
    }

    pub fn values(&self) -> ZipListValues<'_> {
        ZipListValues { inner: self.iter() }
    }

    pub fn hash_iter(&self) -> HashTypeIter<'_> {
        HashTypeIter { inner: self.iter() }
    }
}

impl Iterator for ZipListIter<'_> {
    type Item = Result<usize, ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = if !self.started {
            self.started = true;
            self.ziplist.index(0)
        } else {
            match self.cur {
                Some(cur) => self.ziplist.next(cur),
                None => return None,
            }
        };
        match step {
            Ok(next) => {
                self.cur = next;
                next.map(Ok)
            }
            Err(e) => {
                self.cur = None;
                Some(Err(e))
            }
        }
    }
}

impl Iterator for ZipListRevIter<'_> {
    type Item = Result<usize, ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = if !self.started {
            self.started = true;
            self.ziplist.index(-1)
        } else {
            match self.cur {
                Some(cur) => self.ziplist.prev(cur),
                None => return None,
            }
        };
        match step {
            Ok(prev) => {
                self.cur = prev;
                prev.map(Ok)
            }
            Err(e) => {
                self.cur = None;
                Some(Err(e))
            }
        }
    }
}

impl<'a> Iterator for ZipListValues<'a> {
    type Item = Result<ZipListValue<'a>, ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let ziplist = self.inner.ziplist;
        match self.inner.next()? {
            Ok(pos) => ziplist.get(pos).transpose(),
            Err(e) => Some(Err(e)),
        }
    }
}

impl Iterator for HashTypeIter<'_> {
    type Item = Result<(usize, usize), ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let field = match self.inner.next()? {
            Ok(pos) => pos,
            Err(e) => return Some(Err(e)),
        };
        match self.inner.next() {
            Some(Ok(value)) => Some(Ok((field, value))),
            Some(Err(e)) => Some(Err(e)),
            None => Some(Err(ZipListError::corrupt(field, "hash field without a value"))),
        }
    }
}
