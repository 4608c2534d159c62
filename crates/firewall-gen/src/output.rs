//! Writing generated files to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::GenError;
use crate::hdl::GeneratedFile;

/// Writes every file into `dir`, creating it when missing, and returns the written paths.
///
/// # Errors
///
/// Returns [`GenError::Io`] for the first directory or file that cannot be written.
pub fn write_generated(dir: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>, GenError> {
    fs::create_dir_all(dir).map_err(|e| GenError::io(dir, &e))?;

    files
        .iter()
        .map(|file| {
            let path = dir.join(&file.name);
            fs::write(&path, &file.contents).map_err(|e| GenError::io(&path, &e))?;
            info!(path = %path.display(), bytes = file.contents.len(), "wrote generated file");
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::write_generated;
    use crate::errors::GenError;
    use crate::hdl::GeneratedFile;

    #[test]
    fn writes_into_nested_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("out/vhdl");
        let files = [GeneratedFile {
            name: "a.vhd".to_string(),
            contents: "entity a is end a;\n".to_string(),
        }];

        let written = write_generated(&dir, &files).unwrap();
        assert_eq!(written, vec![dir.join("a.vhd")]);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "entity a is end a;\n"
        );
    }

    #[test]
    fn unwritable_target_reports_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let result = write_generated(&blocker, &[]);
        let Err(GenError::Io { path, .. }) = result else {
            panic!("expected io error");
        };
        assert_eq!(path, blocker);
    }
}
