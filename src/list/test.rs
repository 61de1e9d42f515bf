
#[cfg(test)]
mod test {
    use crate::config::ZipListConfig;
    use crate::list::compact::CompactList;
    use crate::list::List;
    use crate::ziplist::error::ZipListError;
    use crate::ziplist::ziplist::ZipListEntry;

    fn list_of(values: &[&str]) -> CompactList {
        let mut list = CompactList::default();
        for v in values {
            list.add(v.as_bytes()).unwrap();
        }
        list
    }

    fn contents(list: &CompactList) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        list.for_each(|_, v| {
            out.push(v.to_bytes());
            true
        })
        .unwrap();
        out
    }

    fn strs(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    #[test]
    fn list_insert() {
        let mut list = CompactList::default();
        for i in 0..10 {
            list.insert(0, i.to_string().as_bytes()).unwrap();
        }
        for i in 0..10 {
            let len = list.len().unwrap();
            list.insert(len, i.to_string().as_bytes()).unwrap();
        }
        assert_eq!(list.len().unwrap(), 20);
        assert_eq!(list.get(0).unwrap(), ZipListEntry::Int(9));
        assert_eq!(list.get(9).unwrap(), ZipListEntry::Int(0));
        assert_eq!(list.get(10).unwrap(), ZipListEntry::Int(0));
        assert_eq!(list.get(19).unwrap(), ZipListEntry::Int(9));
        assert_eq!(list.insert(21, b"x"), Err(ZipListError::OutOfRange(21)));
        list.ziplist().validate_integrity(true, None).unwrap();
    }

    #[test]
    fn list_get_set() {
        let mut list = list_of(&["a", "b", "c"]);
        list.set(1, b"a much longer replacement").unwrap();
        list.set(2, b"42").unwrap();
        assert_eq!(
            contents(&list),
            strs(&["a", "a much longer replacement", "42"])
        );
        assert_eq!(list.get(2).unwrap(), ZipListEntry::Int(42));
        assert_eq!(list.get(3), Err(ZipListError::OutOfRange(3)));
        assert_eq!(list.set(3, b"x"), Err(ZipListError::OutOfRange(3)));
    }

    #[test]
    fn list_remove() {
        let mut list = list_of(&["a", "b", "c"]);
        assert_eq!(list.remove(1).unwrap(), ZipListEntry::Str(b"b".to_vec()));
        assert_eq!(list.remove_last().unwrap(), Some(ZipListEntry::Str(b"c".to_vec())));
        assert_eq!(list.remove_last().unwrap(), Some(ZipListEntry::Str(b"a".to_vec())));
        assert_eq!(list.remove_last().unwrap(), None);
        assert_eq!(list.remove(0), Err(ZipListError::OutOfRange(0)));
        assert_eq!(list.len().unwrap(), 0);
    }

    #[test]
    fn list_delete_by_value() {
        let mut list = list_of(&["x", "1", "x", "2", "x", "3", "x"]);
        assert_eq!(list.remove_by_val(b"x", 2).unwrap(), 2);
        assert_eq!(contents(&list), strs(&["1", "2", "x", "3", "x"]));

        let mut list = list_of(&["x", "1", "x", "2", "x", "3", "x"]);
        assert_eq!(list.reverse_remove_by_val(b"x", 2).unwrap(), 2);
        assert_eq!(contents(&list), strs(&["x", "1", "x", "2", "3"]));

        let mut list = list_of(&["x", "1", "x", "2", "x", "3", "x"]);
        assert_eq!(list.remove_all_by_val(b"x").unwrap(), 4);
        assert_eq!(contents(&list), strs(&["1", "2", "3"]));
        assert_eq!(list.remove_all_by_val(b"missing").unwrap(), 0);
        assert_eq!(list.remove_all_by_val(b"2").unwrap(), 1);
        assert_eq!(contents(&list), strs(&["1", "3"]));
        list.ziplist().validate_integrity(true, None).unwrap();
    }

    #[test]
    fn list_delete_wide_entries() {
        let long = "w".repeat(300);
        let mut list = list_of(&["a", &long, "b", &long, "c"]);
        assert_eq!(list.remove_all_by_val(long.as_bytes()).unwrap(), 2);
        assert_eq!(contents(&list), strs(&["a", "b", "c"]));
        list.ziplist().validate_integrity(true, None).unwrap();
    }

    #[test]
    fn list_contains_and_range() {
        let list = list_of(&["a", "100", "c", "d"]);
        assert!(list.contains(b"100").unwrap());
        assert!(list.contains(b"c").unwrap());
        assert!(!list.contains(b"0100").unwrap());

        assert_eq!(
            list.range(1, 3).unwrap(),
            vec![ZipListEntry::Int(100), ZipListEntry::Str(b"c".to_vec())]
        );
        assert!(list.range(2, 2).unwrap().is_empty());
        assert_eq!(list.range(2, 5), Err(ZipListError::OutOfRange(5)));
        assert_eq!(list.range(3, 1), Err(ZipListError::OutOfRange(3)));
    }

    #[test]
    fn for_each_stops_early() {
        let list = list_of(&["a", "b", "c", "d"]);
        let mut seen = Vec::new();
        list.for_each(|i, _| {
            seen.push(i);
            i < 1
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn conversion_threshold() {
        let config = ZipListConfig {
            max_entries: 2,
            max_value: 8,
            ..ZipListConfig::default()
        };
        let mut list = CompactList::new(config);
        assert!(!list.needs_conversion(8).unwrap());
        assert!(list.needs_conversion(9).unwrap());
        list.add(b"a").unwrap();
        list.add(b"b").unwrap();
        assert!(list.needs_conversion(1).unwrap());
    }

    #[test]
    fn from_bytes_honours_config() {
        let list = list_of(&["a", "b"]);
        let bytes = list.into_ziplist().into_bytes();

        let mut list = CompactList::from_bytes(bytes.clone(), ZipListConfig::default()).unwrap();
        assert_eq!(list.len().unwrap(), 2);

        let mut broken = bytes;
        broken[11] = 0x30;
        assert!(CompactList::from_bytes(broken.clone(), ZipListConfig::default()).is_err());
        let shallow = ZipListConfig {
            deep_validate: false,
            ..ZipListConfig::default()
        };
        assert!(CompactList::from_bytes(broken, shallow).is_ok());
    }

    #[test]
    fn safety_limit_from_config() {
        let config = ZipListConfig {
            safety_limit: 32,
            ..ZipListConfig::default()
        };
        let mut list = CompactList::new(config);
        list.add(b"short").unwrap();
        assert!(matches!(
            list.add(&[b'z'; 40]),
            Err(ZipListError::TooLarge(_))
        ));
        assert_eq!(list.len().unwrap(), 1);
    }
}
