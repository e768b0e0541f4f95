//! Path helpers for storing snapshot paths relative to the snapshot file.

use std::path::{Component, Path, PathBuf};

/// Express `target` relative to the directory `base`.
///
/// Both paths are expected to be absolute. When they share no root (for
/// example different drive letters on Windows) `target` is returned as-is.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = normalize_path(base);
    let target = normalize_path(target);

    let base_components: Vec<Component<'_>> = base.components().collect();
    let target_components: Vec<Component<'_>> = target.components().collect();

    let common = base_components
        .iter()
        .zip(&target_components)
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return target;
    }

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Lexically resolve `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                None | Some(Component::ParentDir) => normalized.push(".."),
                Some(Component::RootDir | Component::Prefix(_) | Component::CurDir) => {}
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Render a relative path with `/` separators so snapshots are portable
/// between platforms.
pub fn to_portable(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a portable (`/`-separated) relative path back into a native path.
pub fn from_portable(path: &str) -> PathBuf {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect()
}
