use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Relative paths (with `/` separators) of every file under `picture_dir`.
/// A missing directory is an empty set; entries that cannot be read are skipped.
pub fn local_picture_set(picture_dir: &Path) -> HashSet<String> {
    log::debug!("Scanning local pictures in {:?}", picture_dir);
    let mut names = HashSet::new();
    if !picture_dir.exists() {
        log::debug!("{:?} does not exist yet, every picture is missing", picture_dir);
        return names;
    }

    for entry in WalkDir::new(picture_dir).min_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", picture_dir, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(picture_dir) {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            log::trace!("Found local picture: {}", name);
            names.insert(name);
        }
    }

    log::debug!("{} file(s) present in {:?}", names.len(), picture_dir);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.jpg"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("2.jpg"), b"b").unwrap();

        let names = local_picture_set(dir.path());
        assert_eq!(names.len(), 2);
        assert!(names.contains("1.jpg"));
        assert!(names.contains("sub/2.jpg"));
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let names = local_picture_set(&dir.path().join("absent"));
        assert!(names.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.jpg"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop")).unwrap();

        let names = local_picture_set(dir.path());
        assert!(names.contains("1.jpg"));
        assert!(!names.iter().any(|n| n.contains("loop")));
    }
}
