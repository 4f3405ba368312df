//! Helpers for speech capabilities backed by external programs

use std::env;
use std::fs;
use std::path::Path;

/// Whether `command` names an executable, either as a path or via `PATH`
pub fn command_exists(command: &str) -> bool {
    if command.is_empty() {
        return false;
    }
    if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
        return is_executable(Path::new(command));
    }

    env::var_os("PATH")
        .map(|path_var| {
            env::split_paths(&path_var).any(|directory| {
                is_executable(&directory.join(command))
                    || (cfg!(windows) && is_executable(&directory.join(format!("{}.exe", command))))
            })
        })
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|metadata| metadata.is_file() && (metadata.permissions().mode() & 0o111 != 0))
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Replace every placeholder occurrence in each argument
pub fn substitute(args: &[String], values: &[(&str, &str)]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            values
                .iter()
                .fold(arg.clone(), |acc, (placeholder, value)| {
                    acc.replace(placeholder, value)
                })
        })
        .collect()
}
