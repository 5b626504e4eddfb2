//! source text of a conditional config (text and path to source file)
//!
//! Every way to get a config into the engine (a string, a reader, a file) ends up as a [Source]. The whole
//! input is read into memory before parsing starts.
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct Source {
    text: String,
    path: Option<PathBuf>,
}

impl Source {
    /// Read a source from a caller-owned reader
    ///
    /// The reader is borrowed and left open.
    pub fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, LoadError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        Ok(Self {
            text: String::from_utf8(bytes)?,
            path: None,
        })
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let mut file = std::fs::File::open(&file_path)?;
        let source = Self::from_reader(&mut file)?;

        Ok(Self {
            path: Some(file_path),
            ..source
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the source was loaded from, if it was a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self { text, path: None }
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        text.to_owned().into()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("source is not valid utf-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reader_is_read_completely() {
        let mut reader = std::io::Cursor::new("{ a = 1 }\nline\n");
        let source = Source::from_reader(&mut reader).unwrap();
        assert_eq!(source.text(), "{ a = 1 }\nline\n");
        assert_eq!(source.path(), None);

        // still usable by the caller
        assert_eq!(reader.position(), 15);
    }

    #[test]
    fn invalid_utf8() {
        let mut reader: &[u8] = &[b'a', 0xff, b'b'];
        assert!(matches!(
            Source::from_reader(&mut reader),
            Err(LoadError::NotUtf8(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Source::load_file(Path::new("/this/file/does/not/exist.ccfg")),
            Err(LoadError::IoError(_))
        ));
    }
}
