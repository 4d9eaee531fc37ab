//! Corruption and reserved-feature detection in the table reader.
//!
//! Damage is simulated by patching bytes of a finished table file.
//!
//! Coverage:
//! - File shorter than a footer: `Corruption`
//! - Damaged magic number: `Corruption`
//! - Flipped data-block byte: `Corruption` (block checksum) on lookup
//! - Flipped index-block byte: `Corruption` at open
//! - Nonzero compression tag: `NotSupported`

#[cfg(test)]
mod tests {
    use crate::memtable::LookupResult;
    use crate::sstable::{TableBuilder, TableReader, FOOTER_LEN};
    use std::fs::OpenOptions;
    use std::io::{Seek, SeekFrom, Write};
    use std::path::Path;
    use tempfile::TempDir;

    fn build_small_table(path: &Path) {
        let mut builder = TableBuilder::new(path).unwrap();
        for i in 0..100 {
            let key = format!("key{i:04}").into_bytes();
            let value = format!("value{i:04}").into_bytes();
            builder.add(&key, &value).unwrap();
        }
        builder.finish().unwrap();
    }

    fn patch(path: &Path, offset: u64, bytes: &[u8]) {
        let mut file = OpenOptions::new().write(true).open(path).unwrap();
        file.seek(SeekFrom::Start(offset)).unwrap();
        file.write_all(bytes).unwrap();
        file.sync_all().unwrap();
    }

    #[test]
    fn undersized_file_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");
        std::fs::write(&path, vec![0u8; FOOTER_LEN - 1]).unwrap();

        let err = TableReader::open(&path).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn damaged_magic_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");
        build_small_table(&path);

        let len = std::fs::metadata(&path).unwrap().len();
        patch(&path, len - 1, &[0x00]);

        let err = TableReader::open(&path).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn flipped_data_block_byte_fails_lookup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");
        build_small_table(&path);

        // The first data block starts at offset 0; flip a byte inside its
        // first entry.
        patch(&path, 10, &[0xFF]);

        let reader = TableReader::open(&path).unwrap();
        let err = reader.get(b"key0000").unwrap_err();
        assert!(err.is_corruption(), "got {err}");
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn flipped_index_block_byte_fails_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");
        build_small_table(&path);

        // The index block body sits immediately before its 5-byte trailer
        // and the footer.
        let len = std::fs::metadata(&path).unwrap().len();
        patch(&path, len - FOOTER_LEN as u64 - 10, &[0xFF]);

        let err = TableReader::open(&path).unwrap_err();
        assert!(err.is_corruption(), "got {err}");
    }

    #[test]
    fn reserved_compression_tag_is_not_supported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");

        let mut builder = TableBuilder::new(&path).unwrap();
        builder.add(b"key", b"value").unwrap();
        builder.finish().unwrap();

        // With a single tiny data block, its compression tag sits right
        // after the block body. Read the index handle from the footer to
        // locate the data block end precisely: the data block occupies
        // [0, index_offset), so its tag byte is at index_offset - 5.
        let bytes = std::fs::read(&path).unwrap();
        let footer_start = bytes.len() - FOOTER_LEN;
        let index_offset =
            u64::from_le_bytes(bytes[footer_start..footer_start + 8].try_into().unwrap());
        let tag_offset = index_offset - 5;
        patch(&path, tag_offset, &[1]);

        let reader = TableReader::open(&path).unwrap();
        let err = reader.get(b"key").unwrap_err();
        assert!(err.is_not_supported(), "got {err}");
    }

    #[test]
    fn intact_table_still_reads_after_sibling_damage_check() {
        // Control: an untouched table opens and serves every key.
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.sst");
        build_small_table(&path);

        let reader = TableReader::open(&path).unwrap();
        assert_eq!(
            reader.get(b"key0042").unwrap(),
            LookupResult::Value(b"value0042".to_vec())
        );
    }
}
