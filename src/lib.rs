pub mod config;
pub mod list;
pub mod util;
pub mod ziplist;

pub use config::ZipListConfig;
pub use list::compact::CompactList;
pub use list::List;
pub use ziplist::error::ZipListError;
pub use ziplist::ziplist::{ZipList, ZipListEntry, ZipListValue, ZlEntry};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
