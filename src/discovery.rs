use crate::formats;
use crate::utils::dotted_extension;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Recursively collect the files under `root` that should be recompressed.
///
/// A file is kept when its dotted extension is an exact member of
/// `allowed_extensions` and its content sniffs as a re-encodable image.
/// Results follow filesystem enumeration order. Entries that cannot be read
/// during the walk are logged and skipped.
pub fn discover(root: &Path, allowed_extensions: &[String]) -> Vec<PathBuf> {
    collect_images(WalkDir::new(root), allowed_extensions)
}

fn collect_images<I>(entries: I, allowed_extensions: &[String]) -> Vec<PathBuf>
where
    I: IntoIterator<Item = walkdir::Result<DirEntry>>,
{
    let mut image_files = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !is_file(&entry) {
            continue;
        }

        let path = entry.path();
        if !has_allowed_extension(path, allowed_extensions) {
            continue;
        }

        match formats::detect(path) {
            Ok(Some(_)) => image_files.push(path.to_path_buf()),
            Ok(None) => debug!(path = %path.display(), "not image content, skipping"),
            Err(e) => debug!(path = %path.display(), error = %e, "cannot sniff, skipping"),
        }
    }

    image_files
}

/// Regular files, and symlinks that resolve to one. Directory links are
/// never descended into.
fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Exact, case-sensitive extension check
pub fn has_allowed_extension(path: &Path, allowed_extensions: &[String]) -> bool {
    let extension = dotted_extension(path);
    allowed_extensions.iter().any(|allowed| *allowed == extension)
}
