use crate::errors::{Error, Result};
use crate::transformer::LineTransformer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Marker inserted before the suffix of a derived output file.
pub const CHANGED_MARKER: &str = " -Changed";

/// What happens to the transformed text of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Write a sibling copy named with [`CHANGED_MARKER`].
    WriteNew,
    /// Write the sibling copy, then move it over the original.
    ReplaceOriginal,
    /// Emit the transformed lines to a writer; nothing is persisted.
    Print,
}

impl OutputPolicy {
    /// Picks the policy from the two output flags. Replace wins over new-file.
    pub fn from_flags(replace: bool, new_file: bool) -> Self {
        match (replace, new_file) {
            (true, _) => OutputPolicy::ReplaceOriginal,
            (false, true) => OutputPolicy::WriteNew,
            (false, false) => OutputPolicy::Print,
        }
    }
}

/// The result of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A sibling copy was written at this path.
    Written(PathBuf),
    /// The original at this path now holds the transformed content.
    Replaced(PathBuf),
    /// This many lines were printed.
    Printed(usize),
}

/// File mode of the target resolver: reads a file, transforms each line and
/// disposes of the result according to an [`OutputPolicy`].
pub struct Replacer {
    transformer: LineTransformer,
}

impl Replacer {
    pub fn new(transformer: LineTransformer) -> Self {
        Self { transformer }
    }

    pub fn transformer(&self) -> &LineTransformer {
        &self.transformer
    }

    /// Processes a single file.
    ///
    /// The file is read in full and closed before anything is written. In
    /// [`OutputPolicy::Print`] mode the transformed text goes to `out` and the
    /// file is never opened for writing.
    pub fn process_file<W: Write>(
        &self,
        path: &Path,
        policy: OutputPolicy,
        out: &mut W,
    ) -> Result<FileOutcome> {
        info!("Processing {}", path.display());

        let bytes = fs::read(path).map_err(|e| Error::file_access(path, e))?;
        let content = String::from_utf8(bytes).map_err(|e| Error::Transform {
            path: path.to_path_buf(),
            reason: format!(
                "content is not valid UTF-8 (at byte {})",
                e.utf8_error().valid_up_to()
            ),
        })?;
        let new_content = self.transform_content(&content);

        match policy {
            OutputPolicy::Print => {
                out.write_all(new_content.as_bytes())?;
                if !new_content.is_empty() && !new_content.ends_with('\n') {
                    out.write_all(b"\n")?;
                }
                Ok(FileOutcome::Printed(content.split_inclusive('\n').count()))
            }
            OutputPolicy::WriteNew => {
                let target = changed_path(path);
                write_atomic(&target, &new_content, path)?;
                debug!("Wrote {}", target.display());
                Ok(FileOutcome::Written(target))
            }
            OutputPolicy::ReplaceOriginal => {
                let sibling = changed_path(path);
                write_atomic(&sibling, &new_content, path)?;
                move_over(&sibling, path)?;
                debug!("Replaced {}", path.display());
                Ok(FileOutcome::Replaced(path.to_path_buf()))
            }
        }
    }

    /// Transforms every line of `content` independently.
    ///
    /// Lines end at `\n`; a preceding `\r` is treated as part of the
    /// terminator. Terminators are kept as they were, including a missing
    /// final newline.
    pub fn transform_content(&self, content: &str) -> String {
        let mut output = String::with_capacity(content.len());
        for segment in content.split_inclusive('\n') {
            let (line, terminator) = split_terminator(segment);
            output.push_str(&self.transformer.transform(line));
            output.push_str(terminator);
        }
        output
    }
}

fn split_terminator(segment: &str) -> (&str, &str) {
    if let Some(line) = segment.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = segment.strip_suffix('\n') {
        (line, "\n")
    } else {
        (segment, "")
    }
}

/// Derives the output path for `path`: `notes.txt` becomes
/// `notes -Changed.txt` in the same directory. A path without a suffix gets
/// the marker appended.
pub fn changed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{CHANGED_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}{CHANGED_MARKER}"),
    };
    path.with_file_name(name)
}

/// Moves the written `sibling` over `original` in one rename. On failure the
/// sibling is left in place and `original` is untouched.
fn move_over(sibling: &Path, original: &Path) -> Result<()> {
    fs::rename(sibling, original).map_err(|source| Error::ReplaceFailed {
        original: original.to_path_buf(),
        written: sibling.to_path_buf(),
        source,
    })
}

/// Writes `content` to `target` through a temp file in the same directory,
/// copying the permissions of `permissions_from`.
fn write_atomic(target: &Path, content: &str, permissions_from: &Path) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| Error::file_access(target, e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::file_access(target, e))?;

    // Preserve file permissions
    if let Ok(metadata) = fs::metadata(permissions_from) {
        fs::set_permissions(temp_file.path(), metadata.permissions())
            .map_err(|e| Error::file_access(target, e))?;
    }

    temp_file
        .persist(target)
        .map_err(|e| Error::file_access(target, e.error))?;
    Ok(())
}
