use std::path::Path;

pub(crate) fn path_contains(path: &Path, pattern: &str) -> bool {
    match path.as_os_str().to_str() {
        Some(path_str) => path_str.contains(pattern),
        None => false,
    }
}

pub(crate) fn path_contains_any(path: &Path, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| path_contains(path, pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_plain_fit_matches_any() {
        let path = PathBuf::from("rides/morning.fit");
        assert!(path_contains_any(&path, &["fit.gz", ".fit"]));
    }

    #[test]
    fn test_gzipped_fit_matches_any() {
        let path = PathBuf::from("rides/morning.fit.gz");
        assert!(path_contains_any(&path, &["fit.gz", ".fit"]));
    }

    #[test]
    fn test_unrelated_extension_matches_nothing() {
        let path = PathBuf::from("rides/notes.txt");
        assert!(!path_contains_any(&path, &["fit.gz", ".fit", "gpx"]));
    }
}
