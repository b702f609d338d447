//! Temporary key files for session configuration tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Key file removed on drop.
#[derive(Debug)]
pub struct TempKeyFile {
    file: NamedTempFile,
}

impl TempKeyFile {
    /// Write `len` bytes of key material to a fresh file in the temp dir.
    pub fn new(len: usize) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&vec![b'k'; len])?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path_str(&self) -> String {
        self.file.path().to_string_lossy().into_owned()
    }
}
