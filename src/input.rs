#[cfg(not(target_arch = "wasm32"))]
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::error::Result;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug)]
pub enum DataSource {
    #[cfg(not(target_arch = "wasm32"))]
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl DataSource {
    fn as_bytes(&self) -> &[u8] {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            DataSource::Mmap(m) => &m[..],
            DataSource::Owned(v) => v.as_slice(),
        }
    }
}

/// UTF-8 text loaded from disk (memory-mapped) or from memory.
#[derive(Debug)]
pub struct InputText {
    source: DataSource,
}

impl InputText {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        // zero-length files cannot be mapped
        if file.metadata()?.len() == 0 {
            return Ok(Self::from_bytes(Vec::new()));
        }
        // SAFETY: the mapping is read-only and only lives as long as `self`
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            source: DataSource::Mmap(mmap),
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        use std::io::Read;
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            source: DataSource::Owned(bytes),
        }
    }

    /// The text with a leading byte-order mark removed.
    pub fn as_str(&self) -> Result<&str> {
        let bytes = self.source.as_bytes();
        let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
        Ok(std::str::from_utf8(bytes)?)
    }

    pub fn lines(&self) -> Result<impl Iterator<Item = &str> + '_> {
        Ok(self.as_str()?.lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBF\xE1\x9E\x80\nabc\n").unwrap();
        let input = InputText::load(file.path()).unwrap();
        let lines: Vec<&str> = input.lines().unwrap().collect();
        assert_eq!(lines, vec!["\u{1780}", "abc"]);
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input = InputText::load(file.path()).unwrap();
        assert_eq!(input.as_str().unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let input = InputText::from_bytes(vec![0xFF, 0xFE]);
        assert!(matches!(input.as_str(), Err(crate::Error::Utf8(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(InputText::load(missing), Err(crate::Error::Io(_))));
    }
}
