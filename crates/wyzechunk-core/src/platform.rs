use std::env;
use std::path::{Path, PathBuf};

/// Resolve an executable the way a shell would. Names containing a path
/// separator are taken as-is; bare names are searched for on `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_env = env::var_os("PATH")?;
    env::split_paths(&path_env).find_map(|dir| {
        let full = dir.join(name);
        if is_executable(&full) {
            return Some(full);
        }
        #[cfg(target_os = "windows")]
        {
            let exe = full.with_extension("exe");
            if is_executable(&exe) {
                return Some(exe);
            }
        }
        None
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
