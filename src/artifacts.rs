//! Filesystem primitives shared by every stage: idempotent directory
//! creation, size inspection, content digests and metadata-preserving copies.

use sha2::{Digest, Sha256};
use std::fs::{self, File, FileTimes};
use std::io::{self, BufReader};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent};

/// Create every directory in `dirs`, parents included.
///
/// Directories that already exist are left alone and reported with
/// `already_existed: true`.
pub fn create_directories<P: AsRef<Path>>(dirs: &[P], sink: &dyn EventSink) -> Result<()> {
    for dir in dirs {
        create_directory(dir.as_ref(), sink)?;
    }
    Ok(())
}

/// Returns `true` if the directory was newly created.
pub fn create_directory(dir: &Path, sink: &dyn EventSink) -> Result<bool> {
    let already_existed = dir.is_dir();
    if !already_existed {
        // create_dir_all tolerates a concurrent creator winning the race
        fs::create_dir_all(dir)?;
    }
    sink.emit(&PipelineEvent::DirectoryCreated {
        path: dir.to_path_buf(),
        already_existed,
    });
    Ok(!already_existed)
}

/// Size of a file in bytes
pub fn get_size(path: &Path) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PipelineError::source_not_found(path)),
        Err(e) => Err(e.into()),
    }
}

/// Approximate human-readable size, rounded to whole kilobytes
pub fn format_size(bytes: u64) -> String {
    let kb = (bytes as f64 / 1024.0).round() as u64;
    format!("~ {kb} KB")
}

/// Hex-encoded sha256 of a file's contents
pub fn file_digest(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::source_not_found(path),
        _ => e.into(),
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Whether `dest` exists and resolves to the same file as `src`
pub fn same_file(src: &Path, dest: &Path) -> Result<bool> {
    if !dest.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(src)? == fs::canonicalize(dest)?)
}

/// Whole-file copy that carries permissions and access/modification times
/// over to `dest`. Returns the number of bytes copied.
///
/// Copying a file onto itself leaves it untouched and reports its size.
pub fn copy_preserving(src: &Path, dest: &Path) -> Result<u64> {
    if same_file(src, dest)? {
        return get_size(src);
    }

    // fs::copy writes into an existing destination in place, which fails once
    // an earlier copy carried a read-only mode over.
    if dest.is_file() && fs::metadata(dest)?.permissions().readonly() {
        fs::remove_file(dest)?;
    }

    let bytes = fs::copy(src, dest)?;

    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    // fs::copy already carried the permissions over, so a read-only source
    // yields a read-only destination; fall back to a read handle for those.
    let handle = match File::options().write(true).open(dest) {
        Ok(handle) => handle,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => File::open(dest)?,
        Err(e) => return Err(e.into()),
    };
    handle.set_times(times)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::RecordingSink;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::tempdir;

    #[test]
    fn test_create_directory_is_idempotent() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("artifacts").join("data_ingestion");
        let sink = RecordingSink::new();

        assert!(create_directory(&dir, &sink).unwrap());
        assert!(dir.is_dir());
        assert!(!create_directory(&dir, &sink).unwrap());
        assert!(dir.is_dir());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            PipelineEvent::DirectoryCreated { already_existed: false, .. }
        ));
        assert!(matches!(
            events[1],
            PipelineEvent::DirectoryCreated { already_existed: true, .. }
        ));
    }

    #[test]
    fn test_create_directories_handles_several_paths() {
        let tmp = tempdir().unwrap();
        let dirs = [tmp.path().join("a"), tmp.path().join("b/c")];
        let sink = RecordingSink::new();

        create_directories(&dirs, &sink).unwrap();
        create_directories(&dirs, &sink).unwrap();

        assert!(dirs.iter().all(|d| d.is_dir()));
        assert_eq!(sink.count("directory_created"), 4);
    }

    #[test]
    fn test_get_size_reports_missing_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("missing.csv");
        assert!(matches!(
            get_size(&path),
            Err(PipelineError::SourceNotFound { path: p }) if p == path
        ));

        fs::write(&path, b"a,b\n1,2\n").unwrap();
        assert_eq!(get_size(&path).unwrap(), 8);
    }

    #[test]
    fn test_format_size_rounds_to_kilobytes() {
        assert_eq!(format_size(0), "~ 0 KB");
        assert_eq!(format_size(1536), "~ 2 KB");
        assert_eq!(format_size(10 * 1024), "~ 10 KB");
    }

    #[test]
    fn test_digest_matches_for_identical_content() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        assert_eq!(file_digest(&a).unwrap(), file_digest(&b).unwrap());
        fs::write(&b, "different").unwrap();
        assert_ne!(file_digest(&a).unwrap(), file_digest(&b).unwrap());
    }

    #[test]
    fn test_copy_preserving_keeps_content_and_mtime() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("source.csv");
        let dest = tmp.path().join("dest.csv");
        fs::write(&src, "id,name\n1,alpha\n").unwrap();

        let past = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_times(FileTimes::new().set_modified(past))
            .unwrap();

        let bytes = copy_preserving(&src, &dest).unwrap();

        assert_eq!(bytes, get_size(&src).unwrap());
        assert_eq!(fs::read(&src).unwrap(), fs::read(&dest).unwrap());
        let secs = |t: SystemTime| t.duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert_eq!(
            secs(fs::metadata(&dest).unwrap().modified().unwrap()),
            secs(past)
        );
    }

    #[test]
    fn test_copy_onto_itself_keeps_content() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("gsearch_jobs.csv");
        fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();
        let alias = tmp.path().join(".").join("gsearch_jobs.csv");

        assert!(same_file(&path, &alias).unwrap());
        assert_eq!(copy_preserving(&path, &alias).unwrap(), 12);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn test_copy_replaces_read_only_destination() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("source.csv");
        let dest = tmp.path().join("dest.csv");
        fs::write(&src, "id\n1\n").unwrap();
        fs::write(&dest, "stale").unwrap();
        let mut perms = fs::metadata(&dest).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&dest, perms).unwrap();

        copy_preserving(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "id\n1\n");
        assert!(!same_file(&src, &dest).unwrap());
    }
}
