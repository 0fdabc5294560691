//! CSV test-input parsing.
//!
//! The first line is a header; any column whose label begins with
//! `Read object` carries read addresses, any beginning with
//! `Written object` carries write addresses. Each following line is one
//! transaction, empty cells meaning "no object here". Addresses are decimal.

use crate::error::HarnessError;
use puppet_types::{InputTransaction, ObjectAddress, TxId, MAX_OBJECTS_PER_SET};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::IntErrorKind;
use std::path::Path;

fn parse_address(value: &str) -> Result<ObjectAddress, HarnessError> {
    match value.parse::<u64>() {
        Ok(address) => Ok(ObjectAddress::new(address)),
        Err(err) if matches!(err.kind(), IntErrorKind::PosOverflow) => {
            Err(HarnessError::OutOfRange(value.to_string()))
        }
        Err(_) => Err(HarnessError::NotAnAddress(value.to_string())),
    }
}

/// Load one CSV file, assigning transaction ids sequentially from
/// `first_tid`.
pub fn load_transactions(
    path: &Path,
    first_tid: u64,
) -> Result<Vec<InputTransaction>, HarnessError> {
    let file =
        File::open(path).map_err(|_| HarnessError::FileNotFound(path.to_path_buf()))?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| HarnessError::MissingHeader(path.to_path_buf()))?;

    let mut read_columns = HashSet::new();
    let mut write_columns = HashSet::new();
    for (i, label) in header.split(',').enumerate() {
        if label.starts_with("Read object") {
            read_columns.insert(i);
        } else if label.starts_with("Written object") {
            write_columns.insert(i);
        }
    }
    if read_columns.len() > MAX_OBJECTS_PER_SET {
        return Err(HarnessError::TooManyColumns {
            kind: "read",
            count: read_columns.len(),
        });
    }
    if write_columns.len() > MAX_OBJECTS_PER_SET {
        return Err(HarnessError::TooManyColumns {
            kind: "written",
            count: write_columns.len(),
        });
    }

    let mut transactions = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut txn = InputTransaction::new(TxId::new(first_tid + transactions.len() as u64));
        for (i, value) in line.split(',').enumerate() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if read_columns.contains(&i) {
                txn.add_read(parse_address(value)?)?;
            } else if write_columns.contains(&i) {
                txn.add_write(parse_address(value)?)?;
            }
        }
        transactions.push(txn);
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_basic_file() {
        let file = write_file(
            "Transaction,Read object 1,Read object 2,Written object 1\n\
             0,10,20,30\n\
             1,11,,31\n",
        );
        let transactions = load_transactions(file.path(), 0).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].tid(), TxId::new(0));
        assert_eq!(
            transactions[0].reads(),
            &[ObjectAddress::new(10), ObjectAddress::new(20)]
        );
        assert_eq!(transactions[0].writes(), &[ObjectAddress::new(30)]);
        // Empty cell skipped.
        assert_eq!(transactions[1].reads(), &[ObjectAddress::new(11)]);
    }

    #[test]
    fn test_first_tid_offset() {
        let file = write_file("Read object 1\n5\n6\n");
        let transactions = load_transactions(file.path(), 10).unwrap();
        assert_eq!(transactions[0].tid(), TxId::new(10));
        assert_eq!(transactions[1].tid(), TxId::new(11));
    }

    #[test]
    fn test_unrelated_columns_ignored() {
        let file = write_file("Timestamp,Read object 1,Comment\n999,5,hello\n");
        let transactions = load_transactions(file.path(), 0).unwrap();
        assert_eq!(transactions[0].reads(), &[ObjectAddress::new(5)]);
        assert!(transactions[0].writes().is_empty());
    }

    #[test]
    fn test_missing_file_is_exit_code_1() {
        let err = load_transactions(Path::new("/nonexistent/tests.csv"), 0).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_empty_file_is_exit_code_2() {
        let file = write_file("");
        let err = load_transactions(file.path(), 0).unwrap_err();
        assert!(matches!(err, HarnessError::MissingHeader(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_non_numeric_address_is_exit_code_3() {
        let file = write_file("Read object 1\nxyzzy\n");
        let err = load_transactions(file.path(), 0).unwrap_err();
        assert!(matches!(err, HarnessError::NotAnAddress(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_address_overflow_is_exit_code_4() {
        let file = write_file("Read object 1\n99999999999999999999999999\n");
        let err = load_transactions(file.path(), 0).unwrap_err();
        assert!(matches!(err, HarnessError::OutOfRange(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_negative_address_rejected() {
        let file = write_file("Read object 1\n-5\n");
        let err = load_transactions(file.path(), 0).unwrap_err();
        assert!(matches!(err, HarnessError::NotAnAddress(_)));
    }

    #[test]
    fn test_too_many_object_columns() {
        let labels: Vec<String> = (1..=9).map(|i| format!("Read object {i}")).collect();
        let file = write_file(&format!("{}\n", labels.join(",")));
        let err = load_transactions(file.path(), 0).unwrap_err();
        assert!(matches!(err, HarnessError::TooManyColumns { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let file = write_file("Read object 1\n5\n\n6\n");
        let transactions = load_transactions(file.path(), 0).unwrap();
        assert_eq!(transactions.len(), 2);
    }
}
