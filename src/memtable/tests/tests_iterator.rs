//! Cursor positioning, ordering, and saturation semantics.

#[cfg(test)]
mod tests {
    use crate::memtable::MemTable;

    fn sample() -> MemTable {
        let mut mem = MemTable::new();
        for (k, v) in [
            (b"banana".as_slice(), b"2".as_slice()),
            (b"apple", b"1"),
            (b"date", b"4"),
            (b"cherry", b"3"),
        ] {
            mem.put(k, v);
        }
        mem
    }

    #[test]
    fn yields_keys_in_ascending_order() {
        let mem = sample();
        let mut it = mem.new_iter();
        it.seek_to_first();

        let mut keys = Vec::new();
        while it.valid() {
            keys.push(it.key().to_vec());
            it.next();
        }
        assert_eq!(keys, vec![b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec(), b"date".to_vec()]);
    }

    #[test]
    fn fresh_cursor_is_invalid() {
        let mem = sample();
        let it = mem.new_iter();
        assert!(!it.valid());
        assert_eq!(it.key(), b"");
        assert_eq!(it.value(), b"");
    }

    #[test]
    fn seek_positions_at_first_key_gte_target() {
        let mem = sample();
        let mut it = mem.new_iter();

        it.seek(b"banana");
        assert!(it.valid());
        assert_eq!(it.key(), b"banana");

        it.seek(b"bb");
        assert!(it.valid());
        assert_eq!(it.key(), b"cherry");

        it.seek(b"zzz");
        assert!(!it.valid());
    }

    #[test]
    fn seek_to_last_lands_on_final_entry() {
        let mem = sample();
        let mut it = mem.new_iter();
        it.seek_to_last();
        assert!(it.valid());
        assert_eq!(it.key(), b"date");

        it.next();
        assert!(!it.valid());
    }

    #[test]
    fn prev_saturates_at_first_entry() {
        let mem = sample();
        let mut it = mem.new_iter();
        it.seek_to_first();
        assert_eq!(it.key(), b"apple");

        it.prev();
        assert!(it.valid());
        assert_eq!(it.key(), b"apple");

        it.prev();
        assert!(it.valid());
        assert_eq!(it.key(), b"apple");
    }

    #[test]
    fn prev_from_past_the_end_reenters_at_last() {
        let mem = sample();
        let mut it = mem.new_iter();
        it.seek_to_last();
        it.next();
        assert!(!it.valid());

        it.prev();
        assert!(it.valid());
        assert_eq!(it.key(), b"date");
    }

    #[test]
    fn empty_memtable_cursor_never_validates() {
        let mem = MemTable::new();
        let mut it = mem.new_iter();
        it.seek_to_first();
        assert!(!it.valid());
        it.seek_to_last();
        assert!(!it.valid());
        it.prev();
        assert!(!it.valid());
        assert_eq!(it.key(), b"");
    }

    #[test]
    fn tombstones_are_exposed_verbatim() {
        let mut mem = MemTable::new();
        mem.put(b"a", b"1");
        mem.delete(b"b");

        let mut it = mem.new_iter();
        it.seek(b"b");
        assert!(it.valid());
        assert_eq!(it.key(), b"b");
        assert_eq!(it.value(), b"\x00");
    }

    #[test]
    fn status_is_ok() {
        let mem = sample();
        let mut it = mem.new_iter();
        it.seek_to_first();
        assert!(it.status().is_ok());
    }
}
