//! Block builder / reader round-trips, restart points, and seek.

#[cfg(test)]
mod tests {
    use crate::sstable::{BlockBuilder, BlockReader};

    /// Build a finished block body from `(key, value)` pairs.
    fn build(restart_interval: usize, pairs: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut builder = BlockBuilder::new(restart_interval);
        for (key, value) in pairs {
            builder.add(key, value);
        }
        builder.finish().to_vec()
    }

    fn collect(reader: &mut BlockReader) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut out = Vec::new();
        reader.seek_to_first().unwrap();
        while reader.valid() {
            out.push((reader.key().to_vec(), reader.value().to_vec()));
            reader.next().unwrap();
        }
        out
    }

    #[test]
    fn round_trips_entries_in_order() {
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..100)
            .map(|i| {
                (
                    format!("key{i:04}").into_bytes(),
                    format!("value{i}").into_bytes(),
                )
            })
            .collect();
        let borrowed: Vec<(&[u8], &[u8])> = pairs
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();

        for interval in [1, 2, 16] {
            let body = build(interval, &borrowed);
            let mut reader = BlockReader::new(body).unwrap();
            let decoded = collect(&mut reader);
            assert_eq!(decoded, pairs, "restart interval {interval}");
        }
    }

    #[test]
    fn prefix_compression_shrinks_shared_keys() {
        let shared: Vec<(Vec<u8>, Vec<u8>)> = (0..64)
            .map(|i| (format!("user:common:prefix:{i:04}").into_bytes(), vec![b'v']))
            .collect();
        let pairs: Vec<(&[u8], &[u8])> = shared
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();

        let compressed = build(16, &pairs);
        let uncompressed = build(1, &pairs);
        assert!(
            compressed.len() < uncompressed.len(),
            "{} !< {}",
            compressed.len(),
            uncompressed.len()
        );
    }

    #[test]
    fn seek_finds_first_key_gte_target() {
        let body = build(
            2,
            &[
                (b"user:001", b"a"),
                (b"user:002", b"b"),
                (b"user:003", b"c"),
                (b"user:010", b"d"),
                (b"user:100", b"e"),
            ],
        );
        let mut reader = BlockReader::new(body).unwrap();

        reader.seek(b"user:005").unwrap();
        assert!(reader.valid());
        assert_eq!(reader.key(), b"user:010");

        reader.seek(b"user:000").unwrap();
        assert!(reader.valid());
        assert_eq!(reader.key(), b"user:001");

        reader.seek(b"user:002").unwrap();
        assert!(reader.valid());
        assert_eq!(reader.key(), b"user:002");
        assert_eq!(reader.value(), b"b");

        reader.seek(b"user:999").unwrap();
        assert!(!reader.valid());
    }

    #[test]
    fn seek_works_inside_long_restart_runs() {
        // One restart run of 16 entries; targets landing mid-run must be
        // found by the forward scan from the run's restart point.
        let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..16)
            .map(|i| (format!("k{i:02}").into_bytes(), vec![i as u8]))
            .collect();
        let borrowed: Vec<(&[u8], &[u8])> = pairs
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        let mut reader = BlockReader::new(build(16, &borrowed)).unwrap();

        for i in 0..16 {
            let target = format!("k{i:02}").into_bytes();
            reader.seek(&target).unwrap();
            assert!(reader.valid());
            assert_eq!(reader.key(), target.as_slice());
        }
    }

    #[test]
    fn empty_values_round_trip() {
        let body = build(16, &[(b"a", b""), (b"b", b"x"), (b"c", b"")]);
        let mut reader = BlockReader::new(body).unwrap();
        let decoded = collect(&mut reader);
        assert_eq!(decoded[0], (b"a".to_vec(), Vec::new()));
        assert_eq!(decoded[2], (b"c".to_vec(), Vec::new()));
    }

    #[test]
    fn add_after_finish_is_ignored() {
        let mut builder = BlockBuilder::new(16);
        builder.add(b"a", b"1");
        let len = builder.finish().len();
        builder.add(b"b", b"2");
        assert_eq!(builder.finish().len(), len);
    }

    #[test]
    fn reset_clears_for_reuse() {
        let mut builder = BlockBuilder::new(16);
        builder.add(b"a", b"1");
        let first = builder.finish().to_vec();

        builder.reset();
        assert!(builder.is_empty());
        assert_eq!(builder.last_key(), b"");

        builder.add(b"a", b"1");
        assert_eq!(builder.finish(), first.as_slice());
    }

    #[test]
    fn last_key_tracks_additions() {
        let mut builder = BlockBuilder::new(16);
        assert_eq!(builder.last_key(), b"");
        builder.add(b"apple", b"1");
        assert_eq!(builder.last_key(), b"apple");
        builder.add(b"banana", b"2");
        assert_eq!(builder.last_key(), b"banana");
    }

    #[test]
    fn size_estimate_bounds_serialized_length() {
        let mut builder = BlockBuilder::new(4);
        for i in 0..50 {
            let key = format!("key{i:03}").into_bytes();
            builder.add(&key, b"some value bytes");
            assert!(builder.current_size_estimate() > 0);
        }
        let estimate = builder.current_size_estimate();
        let actual = builder.finish().len();
        assert!(estimate >= actual, "{estimate} < {actual}");
    }

    #[test]
    fn single_entry_block() {
        let body = build(16, &[(b"only", b"one")]);
        let mut reader = BlockReader::new(body).unwrap();
        reader.seek(b"only").unwrap();
        assert!(reader.valid());
        assert_eq!(reader.value(), b"one");
        reader.next().unwrap();
        assert!(!reader.valid());
        assert_eq!(reader.key(), b"");
        assert_eq!(reader.value(), b"");
    }
}
