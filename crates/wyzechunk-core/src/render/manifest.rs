use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One concat-demuxer entry: `file '<path>'`. Single quotes inside the path
/// are closed, escaped and reopened (`'\''`).
pub fn manifest_line(path: &Path) -> io::Result<String> {
    let path_str = path.to_str().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Path is not valid UTF-8: {}", path.display()),
        )
    })?;
    if path_str.contains(['\n', '\r']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Path contains a line break: {:?}", path_str),
        ));
    }
    Ok(format!("file '{}'", path_str.replace('\'', r"'\''")))
}

/// Write the ordered manifest to a temp file that is deleted when dropped.
pub fn write_manifest(paths: &[PathBuf]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("wyzechunk-")
        .suffix(".txt")
        .tempfile()?;
    for path in paths {
        writeln!(file, "{}", manifest_line(path)?)?;
    }
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_plain_path() {
        let line = manifest_line(Path::new("/rec/20240101/10/00.mp4")).unwrap();
        assert_eq!(line, "file '/rec/20240101/10/00.mp4'");
    }

    #[test]
    fn test_single_quote_is_escaped() {
        let line = manifest_line(Path::new("/home/o'neil/00.mp4")).unwrap();
        assert_eq!(line, r"file '/home/o'\''neil/00.mp4'");
    }

    #[test]
    fn test_newline_is_rejected() {
        let err = manifest_line(Path::new("/rec/bad\nname/00.mp4")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_manifest_keeps_order_and_is_removed_on_drop() {
        let paths = vec![PathBuf::from("/r/10/01.mp4"), PathBuf::from("/r/10/00.mp4")];
        let manifest = write_manifest(&paths).unwrap();
        let manifest_path = manifest.path().to_path_buf();

        let content = fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(content, "file '/r/10/01.mp4'\nfile '/r/10/00.mp4'\n");

        drop(manifest);
        assert!(!manifest_path.exists());
    }
}
