//! IO helper: JSON file loading for datasets, topic catalogs and config

use std::{fs::File, io::BufReader, path::Path};

use serde_json::Value;
use crate::model::diagram::DiagramError;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, DiagramError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    tracing::debug!("已读取JSON文件: {}", p.display());
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "Stack", "children": [] }}"#).unwrap();

        let v = read_json_file(file.path()).unwrap();
        assert_eq!(v["name"], "Stack");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DiagramError::Io(_)));
    }

    #[test]
    fn test_read_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ name: ").unwrap();
        assert!(matches!(read_json_file(file.path()), Err(DiagramError::Parse(_))));
    }
}
