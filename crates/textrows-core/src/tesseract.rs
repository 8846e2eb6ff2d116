//! Word boxes from the Tesseract command-line engine

use crate::error::TextRowsError;
use crate::tsv::{parse_tsv, WordBox};
use std::path::Path;
use std::process::Command;

pub const DEFAULT_LANG: &str = "jpn";
pub const DEFAULT_PROGRAM: &str = "tesseract";

/// Anything that can produce word boxes for an image file
pub trait WordSource {
    fn words(&self, image_path: &Path) -> Result<Vec<WordBox>, TextRowsError>;
}

/// Runs `tesseract <image> stdout -l <lang> tsv`
#[derive(Debug, Clone)]
pub struct Tesseract {
    program: String,
    lang: String,
}

impl Tesseract {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            lang: DEFAULT_LANG.to_string(),
        }
    }

    /// Use a specific executable instead of `tesseract` on PATH
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Language pack(s), e.g. `jpn` or `jpn+eng`
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    fn run_tsv(&self, image_path: &Path) -> Result<String, TextRowsError> {
        tracing::debug!(
            program = %self.program,
            lang = %self.lang,
            image = %image_path.display(),
            "running tesseract"
        );

        let output = Command::new(&self.program)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("tsv")
            .output()
            .map_err(|source| TextRowsError::TesseractSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TextRowsError::TesseractFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new()
    }
}

impl WordSource for Tesseract {
    fn words(&self, image_path: &Path) -> Result<Vec<WordBox>, TextRowsError> {
        parse_tsv(&self.run_tsv(image_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let tesseract = Tesseract::default();
        assert_eq!(tesseract.program, "tesseract");
        assert_eq!(tesseract.lang, "jpn");
    }

    #[test]
    fn test_builder() {
        let tesseract = Tesseract::new()
            .with_program("/opt/tesseract/bin/tesseract")
            .with_lang("jpn+eng");
        assert_eq!(tesseract.program, "/opt/tesseract/bin/tesseract");
        assert_eq!(tesseract.lang, "jpn+eng");
    }

    #[test]
    fn test_missing_program_reports_spawn_error() {
        let tesseract = Tesseract::new().with_program("definitely-not-a-real-tesseract-binary");
        let err = tesseract.words(Path::new("page.png")).unwrap_err();
        match err {
            TextRowsError::TesseractSpawn { program, .. } => {
                assert_eq!(program, "definitely-not-a-real-tesseract-binary")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_program_with_tsv_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("tesseract");
        // Echo the arguments back as the text of a single word
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf 'level\\tpage_num\\tblock_num\\tpar_num\\tline_num\\tword_num\\tleft\\ttop\\twidth\\theight\\tconf\\ttext\\n'\nprintf '5\\t1\\t1\\t1\\t1\\t1\\t10\\t20\\t30\\t40\\t96.5\\t%s\\n' \"$*\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tesseract = Tesseract::new()
            .with_program(script.to_string_lossy())
            .with_lang("eng");
        let words = tesseract.words(Path::new("scan.png")).unwrap();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "scan.png stdout -l eng tsv");
        assert_eq!((words[0].left, words[0].top), (10, 20));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("tesseract");
        std::fs::write(&script, "#!/bin/sh\necho 'Failed loading language' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = Tesseract::new()
            .with_program(script.to_string_lossy())
            .words(Path::new("scan.png"))
            .unwrap_err();
        match err {
            TextRowsError::TesseractFailed { stderr, .. } => {
                assert_eq!(stderr, "Failed loading language")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
