use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Pileup profile '{path}' has a gap: expected bin {expected}, found {found}")]
    NonContiguous {
        path: String,
        expected: u32,
        found: u32,
    },
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    pileup: u32,
    content: f64,
}

/// Reads a pileup reference distribution from a `pileup,content` CSV file.
///
/// Rows must list every integer pileup value from `0` upwards, in order; the
/// returned vector is indexed by pileup value. Contents are returned as
/// stored, normalization happens when the reweighting table is built.
pub fn read_profile(path: &Path) -> Result<Vec<f64>, ProfileLoadError> {
    let path_str = || path.to_string_lossy().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ProfileLoadError::Csv {
            path: path_str(),
            source: e,
        })?;

    let mut contents = Vec::new();
    for result in reader.deserialize::<ProfileRow>() {
        let row = result.map_err(|e| ProfileLoadError::Csv {
            path: path_str(),
            source: e,
        })?;
        let expected = contents.len() as u32;
        if row.pileup != expected {
            return Err(ProfileLoadError::NonContiguous {
                path: path_str(),
                expected,
                found: row.pileup,
            });
        }
        contents.push(row.content);
    }
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_contiguous_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pu.csv");
        fs::write(&path, "pileup,content\n0,0.0\n1,12.5\n2,30.0\n").unwrap();

        assert_eq!(read_profile(&path).unwrap(), vec![0.0, 12.5, 30.0]);
    }

    #[test]
    fn gap_in_bins_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pu.csv");
        fs::write(&path, "pileup,content\n0,1.0\n2,1.0\n").unwrap();

        assert!(matches!(
            read_profile(&path),
            Err(ProfileLoadError::NonContiguous {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_a_csv_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_profile(&dir.path().join("missing.csv")),
            Err(ProfileLoadError::Csv { .. })
        ));
    }
}
