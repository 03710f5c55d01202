use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::files::CSV_EXTENSION;
use crate::errors::CorpusError;
use crate::table::RawTable;
use crate::transport::csv::parse_records;

/// Read a CSV file into a [`RawTable`] named after the path.
pub fn read_table(path: &Path) -> Result<RawTable, CorpusError> {
    let text = fs::read_to_string(path).map_err(|err| CorpusError::Csv {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let records = parse_records(&text);
    if records.is_empty() {
        return Err(CorpusError::Csv {
            path: path.to_path_buf(),
            reason: "file has no header row".to_string(),
        });
    }
    Ok(RawTable::from_records(path.display().to_string(), records))
}

/// Write `contents` to `path` through a sibling temp file and a rename.
///
/// Readers never observe a partially written table; the parent directory is
/// created when missing.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), CorpusError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| CorpusError::Io(err.error))?;
    debug!("[serials:fs] wrote {}", path.display());
    Ok(())
}

/// True if the path has a `.csv` extension (case-insensitive).
pub fn is_csv_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
        .unwrap_or(false)
}

/// Every CSV file under `root`, sorted by path. A missing root yields no files.
pub fn csv_files_under(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| is_csv_file(path))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parent_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("volumes").join("arab_observer_v.3.csv");
        write_atomic(&path, "sequence,token\n1,nasser\n").unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["sequence", "token"]);
        assert_eq!(table.cell(0, 1), Some("nasser"));

        write_atomic(&path, "sequence,token\n2,cairo\n").unwrap();
        assert_eq!(read_table(&path).unwrap().cell(0, 0), Some("2"));
    }

    #[test]
    fn read_table_rejects_missing_and_empty_files() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(read_table(&missing), Err(CorpusError::Csv { .. })));
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "\n").unwrap();
        assert!(matches!(read_table(&empty), Err(CorpusError::Csv { .. })));
    }

    #[test]
    fn csv_files_are_listed_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.csv"), "a\n").unwrap();
        fs::write(dir.path().join("nested").join("a.CSV"), "a\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "a\n").unwrap();
        let files = csv_files_under(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
        assert!(csv_files_under(&dir.path().join("absent")).is_empty());
    }
}
