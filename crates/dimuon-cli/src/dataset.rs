use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Files per job when neither the config file nor the command line sets it.
pub const DEFAULT_FILES_PER_JOB: usize = 10;

const LIST_EXTENSION: &str = "list";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No input files listed in any .list file under '{}'", .0.display())]
    NoInputs(PathBuf),
    #[error("Files per job must be at least 1")]
    InvalidFilesPerJob,
    #[error("Job index {index} is out of range: the sample has {jobs} job(s)")]
    JobOutOfRange { index: usize, jobs: usize },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError {
    move |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Collects the input files listed in every `.list` file of `list_dir`.
///
/// List files are read in file-name order and lines in file order, so job
/// slices are reproducible. Blank lines are skipped; relative entries are
/// resolved against the directory of the list file.
pub fn discover_inputs(list_dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let mut lists: Vec<PathBuf> = fs::read_dir(list_dir)
        .map_err(io_error(list_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == LIST_EXTENSION))
        .collect();
    lists.sort();

    let mut inputs = Vec::new();
    for list in &lists {
        let content = fs::read_to_string(list).map_err(io_error(list))?;
        let before = inputs.len();
        inputs.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| list_dir.join(line)),
        );
        debug!(list = %list.display(), files = inputs.len() - before, "Read input list.");
    }

    if inputs.is_empty() {
        return Err(DatasetError::NoInputs(list_dir.to_path_buf()));
    }
    info!(
        lists = lists.len(),
        files = inputs.len(),
        "Discovered input files."
    );
    Ok(inputs)
}

/// Number of jobs needed to cover `n_files` files.
pub fn job_count(n_files: usize, files_per_job: usize) -> Result<usize, DatasetError> {
    if files_per_job == 0 {
        return Err(DatasetError::InvalidFilesPerJob);
    }
    Ok(n_files.div_ceil(files_per_job))
}

/// Returns the contiguous slice of files processed by job `index`.
pub fn job_slice(
    files: &[PathBuf],
    files_per_job: usize,
    index: usize,
) -> Result<&[PathBuf], DatasetError> {
    let jobs = job_count(files.len(), files_per_job)?;
    if index >= jobs {
        return Err(DatasetError::JobOutOfRange { index, jobs });
    }
    let start = index * files_per_job;
    let end = (start + files_per_job).min(files.len());
    Ok(&files[start..end])
}

/// Writes one `<sample>_<idx>.list` file per job slice into `output_dir`.
pub fn write_job_lists(
    sample: &str,
    files: &[PathBuf],
    files_per_job: usize,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, DatasetError> {
    let jobs = job_count(files.len(), files_per_job)?;
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;

    let mut written = Vec::with_capacity(jobs);
    for index in 0..jobs {
        let slice = job_slice(files, files_per_job, index)?;
        let path = output_dir.join(format!("{sample}_{index}.{LIST_EXTENSION}"));
        let mut content = String::new();
        for file in slice {
            content.push_str(&file.to_string_lossy());
            content.push('\n');
        }
        fs::write(&path, content).map_err(io_error(&path))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{i}.csv"))).collect()
    }

    #[test]
    fn job_count_rounds_up() {
        assert_eq!(job_count(0, 10).unwrap(), 0);
        assert_eq!(job_count(10, 10).unwrap(), 1);
        assert_eq!(job_count(11, 10).unwrap(), 2);
        assert!(matches!(job_count(5, 0), Err(DatasetError::InvalidFilesPerJob)));
    }

    #[test]
    fn slices_are_contiguous_and_last_one_is_short() {
        let all = files(7);
        assert_eq!(job_slice(&all, 3, 0).unwrap(), &all[0..3]);
        assert_eq!(job_slice(&all, 3, 2).unwrap(), &all[6..7]);
        assert!(matches!(
            job_slice(&all, 3, 3),
            Err(DatasetError::JobOutOfRange { index: 3, jobs: 3 })
        ));
    }

    #[test]
    fn discovers_list_entries_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.list"), "b1.csv\n\n  b2.csv  \n").unwrap();
        fs::write(dir.path().join("a.list"), "/abs/a1.csv\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored.csv\n").unwrap();

        let inputs = discover_inputs(dir.path()).unwrap();

        assert_eq!(
            inputs,
            vec![
                PathBuf::from("/abs/a1.csv"),
                dir.path().join("b1.csv"),
                dir.path().join("b2.csv"),
            ]
        );
    }

    #[test]
    fn empty_list_directory_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("empty.list"), "\n").unwrap();
        assert!(matches!(
            discover_inputs(dir.path()),
            Err(DatasetError::NoInputs(_))
        ));
    }

    #[test]
    fn writes_one_list_per_job() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("jobs");

        let written = write_job_lists("DYJetsToLL", &files(5), 2, &out).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(written[2], out.join("DYJetsToLL_2.list"));
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "f0.csv\nf1.csv\n");
        assert_eq!(fs::read_to_string(&written[2]).unwrap(), "f4.csv\n");
    }
}
