use memchr::memmem;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::PathBuf;

const CRAM_MARK: &[u8] = b".cram";
const UNMATCHED_MARK: &[u8] = b"unmatched";

/// Turns the user's path argument into at most `max` candidate archives.
///
/// In order of precedence the argument is read as:
///
/// 1. an existing regular file, returned verbatim with no name checks;
/// 2. an existing directory, whose entries containing `.cram` (and not
///    `unmatched`) are collected;
/// 3. `<dir>/<prefix>`, collecting entries of `<dir>` (`.` when there is no
///    separator) that start with `<prefix>` and pass the same name filter.
///
/// Entries come back in directory enumeration order. A directory that cannot
/// be read simply yields nothing.
pub fn resolve(path: &str, max: usize) -> Vec<PathBuf> {
    if max == 0 {
        return Vec::new();
    }
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => return vec![PathBuf::from(path)],
        Ok(meta) if meta.is_dir() => return scan_dir(path, b"", max),
        _ => {}
    }
    let (dir, prefix) = split_prefix(path);
    scan_dir(dir, prefix.as_bytes(), max)
}

fn split_prefix(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => (".", path),
    }
}

fn scan_dir(dir: &str, prefix: &[u8], max: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_candidate(name.as_encoded_bytes(), prefix) {
            continue;
        }
        out.push(join(dir, &name));
        if out.len() >= max {
            break;
        }
    }
    out
}

fn is_candidate(name: &[u8], prefix: &[u8]) -> bool {
    name.starts_with(prefix)
        && memmem::find(name, CRAM_MARK).is_some()
        && memmem::find(name, UNMATCHED_MARK).is_none()
}

fn join(dir: &str, name: &OsStr) -> PathBuf {
    let mut joined = OsString::from(dir);
    if !dir.ends_with('/') {
        joined.push("/");
    }
    joined.push(name);
    PathBuf::from(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn dir_str(dir: &TempDir) -> String {
        dir.path().to_str().unwrap().to_string()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn regular_file_is_returned_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "reads.bam");
        let arg = format!("{}/reads.bam", dir_str(&temp_dir));

        let found = resolve(&arg, 100);
        assert_eq!(found, vec![PathBuf::from(&arg)]);
    }

    #[test]
    fn directory_filters_by_name() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "a.cram",
            "b.cram",
            "b.cram.crai",
            "sample_unmatched.cram",
            "notes.txt",
            "c.bam",
        ] {
            touch(temp_dir.path(), name);
        }

        let found = resolve(&dir_str(&temp_dir), 100);
        assert_eq!(names(&found), vec!["a.cram", "b.cram", "b.cram.crai"]);
        for path in &found {
            assert_eq!(path.parent().unwrap(), temp_dir.path());
            assert!(path.exists());
        }
    }

    #[test]
    fn directory_stops_at_max() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            touch(temp_dir.path(), &format!("lane{i}.cram"));
        }

        assert_eq!(resolve(&dir_str(&temp_dir), 3).len(), 3);
        assert_eq!(resolve(&dir_str(&temp_dir), 100).len(), 5);
        assert!(resolve(&dir_str(&temp_dir), 0).is_empty());
    }

    #[test]
    fn trailing_separator_is_not_doubled() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "x.cram");
        let arg = format!("{}/", dir_str(&temp_dir));

        let found = resolve(&arg, 100);
        assert_eq!(found, vec![PathBuf::from(format!("{arg}x.cram"))]);
    }

    #[test]
    fn prefix_selects_matching_entries() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "420071-S1_QSR-1_L001.cram",
            "420071-S1_QSR-1_L002.cram",
            "420071-S1_QSR-1_unmatched.cram",
            "420071-S1_QSR-1.txt",
            "420071-S2_QSR-1_L001.cram",
        ] {
            touch(temp_dir.path(), name);
        }
        let arg = format!("{}/420071-S1_QSR-1", dir_str(&temp_dir));

        let found = resolve(&arg, 100);
        assert_eq!(
            names(&found),
            vec!["420071-S1_QSR-1_L001.cram", "420071-S1_QSR-1_L002.cram"]
        );
    }

    #[test]
    fn prefix_without_matches_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.cram");
        let arg = format!("{}/zzz", dir_str(&temp_dir));

        assert!(resolve(&arg, 100).is_empty());
    }

    #[test]
    fn missing_search_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let arg = format!("{}/no/such/dir/prefix", dir_str(&temp_dir));

        assert!(resolve(&arg, 100).is_empty());
    }

    #[test]
    fn split_prefix_forms() {
        assert_eq!(split_prefix("/data/run/S1"), ("/data/run", "S1"));
        assert_eq!(split_prefix("S1"), (".", "S1"));
        assert_eq!(split_prefix("/S1"), ("/", "S1"));
        assert_eq!(split_prefix("dir/"), ("dir", ""));
    }

    #[test]
    fn candidate_name_rules() {
        assert!(is_candidate(b"S1.cram", b""));
        assert!(is_candidate(b"S1.cram", b"S1"));
        assert!(!is_candidate(b"S1.cram", b"S2"));
        assert!(!is_candidate(b"S1.bam", b""));
        assert!(!is_candidate(b"S1.unmatched.cram", b""));
        assert!(is_candidate(b"S1.cram.crai", b"S1"));
    }
}
