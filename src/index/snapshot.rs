//! On-disk snapshot of the ordered prefix index.
//!
//! The snapshot is a single JSON Lines file:
//!
//! - line 1: a `SnapshotHeader` object
//! - every following line: one JSON string entry, ascending
//!
//! Writes go to `<path>.tmp` and are renamed into place, so readers only
//! ever observe a complete snapshot.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::index::prefix::PrefixIndex;
use crate::index::SeedError;

pub const SNAPSHOT_SCHEMA_VERSION: &str = "1";

/// Metadata stored on the first line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub schema_version: String,
    /// Version of the speedsearch tool that wrote the snapshot.
    pub tool_version: String,
    pub words: u64,
    pub entries: u64,
    /// Unix timestamp (seconds since epoch) of the rebuild.
    pub created_at: u64,
}

/// Persist `index` atomically at `path`.
pub fn write_snapshot(
    path: &Path,
    index: &PrefixIndex,
    created_at: u64,
) -> Result<SnapshotHeader, SeedError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let header = SnapshotHeader {
        schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        words: index.word_count(),
        entries: index.entries().len() as u64,
        created_at,
    };

    let tmp_path = tmp_path_for(path);
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, &header)?;
    writer.write_all(b"\n")?;

    for entry in index.entries() {
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(&tmp_path, path)?;
    Ok(header)
}

/// Load a snapshot, validating its header against the stored entries.
pub fn read_snapshot(path: &Path) -> Result<(SnapshotHeader, PrefixIndex), SeedError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header_line = lines
        .next()
        .transpose()?
        .ok_or_else(|| SeedError::corrupt(path, "missing header line"))?;
    let header: SnapshotHeader = serde_json::from_str(&header_line)?;

    if header.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(SeedError::corrupt(
            path,
            format!(
                "unsupported schema version {}; expected {}",
                header.schema_version, SNAPSHOT_SCHEMA_VERSION
            ),
        ));
    }

    let mut entries = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: String = serde_json::from_str(&line)?;
        entries.push(entry);
    }

    if entries.len() as u64 != header.entries {
        return Err(SeedError::corrupt(
            path,
            format!(
                "header declares {} entries but {} were read",
                header.entries,
                entries.len()
            ),
        ));
    }

    let index = PrefixIndex::from_sorted_entries(entries)
        .ok_or_else(|| SeedError::corrupt(path, "entries are not in ascending order"))?;

    if index.word_count() != header.words {
        return Err(SeedError::corrupt(
            path,
            format!(
                "header declares {} words but {} terminal entries were read",
                header.words,
                index.word_count()
            ),
        ));
    }

    Ok((header, index))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snapshot_restores_the_same_index() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("ordered.jsonl");

        let index = PrefixIndex::build(["France", "Germany", "Côte d'Ivoire"]).expect("index");
        let written = write_snapshot(&path, &index, 1_700_000_000).expect("write");
        assert_eq!(written.words, 3);
        assert!(!dir.path().join("nested").join("ordered.jsonl.tmp").exists());

        let (header, restored) = read_snapshot(&path).expect("read");
        assert_eq!(header, written);
        assert_eq!(restored, index);
    }

    #[test]
    fn snapshot_with_wrong_entry_count_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ordered.jsonl");

        let header = SnapshotHeader {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            tool_version: "test".to_string(),
            words: 1,
            entries: 5,
            created_at: 0,
        };
        let contents = format!("{}\n\"\"\n\"A\"\n", serde_json::to_string(&header).unwrap());
        fs::write(&path, contents).expect("write");

        let err = read_snapshot(&path).expect_err("count mismatch");
        assert!(matches!(err, SeedError::CorruptSnapshot { .. }));
    }

    #[test]
    fn snapshot_with_oversized_entry_count_is_rejected_without_allocating() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ordered.jsonl");

        let header = SnapshotHeader {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            tool_version: "test".to_string(),
            words: 0,
            entries: u64::MAX,
            created_at: 0,
        };
        let contents = format!("{}\n\"\"\n", serde_json::to_string(&header).unwrap());
        fs::write(&path, contents).expect("write");

        let err = read_snapshot(&path).expect_err("oversized count");
        assert!(matches!(err, SeedError::CorruptSnapshot { .. }));
    }

    #[test]
    fn snapshot_with_wrong_word_count_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ordered.jsonl");

        let index = PrefixIndex::build(["Peru"]).expect("index");
        write_snapshot(&path, &index, 0).expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        let contents = contents.replacen("\"words\":1", "\"words\":2", 1);
        fs::write(&path, contents).expect("rewrite");

        let err = read_snapshot(&path).expect_err("word mismatch");
        assert!(matches!(err, SeedError::CorruptSnapshot { .. }));
    }
}
