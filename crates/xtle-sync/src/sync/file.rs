//! A translation file on disk

use xtle_files::{NormalizedPath, RobustnessConfig, checksum, io};

use crate::format::{TranslationFile, TranslationFormat};
use crate::Result;

#[derive(Debug, Clone)]
pub struct FsFile {
    fs_path: String,
    path: NormalizedPath,
}

impl FsFile {
    pub fn new(fs_root: &NormalizedPath, fs_path: &str) -> Self {
        Self {
            fs_path: fs_path.to_string(),
            path: fs_root.join(fs_path),
        }
    }

    pub fn fs_path(&self) -> &str {
        &self.fs_path
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn format(&self) -> Result<TranslationFormat> {
        TranslationFormat::from_path(&self.fs_path)
    }

    /// Raw content, or `None` if the file does not exist.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(io::read_bytes(&self.path)?)
    }

    pub fn write(&self, content: &[u8]) -> Result<()> {
        io::write_atomic(&self.path, content, RobustnessConfig::default())?;
        Ok(())
    }

    pub fn fingerprint(&self) -> Result<Option<String>> {
        Ok(checksum::fingerprint_file(&self.path.to_native())?)
    }

    /// Parsed content, or `None` if the file does not exist.
    pub fn deserialize(&self) -> Result<Option<TranslationFile>> {
        match self.read()? {
            Some(bytes) => Ok(Some(self.format()?.parse(&self.fs_path, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn serialize(&self, file: &TranslationFile) -> Result<Vec<u8>> {
        self.format()?.serialize(file)
    }

    /// Delete the file. Returns whether there was anything to delete.
    pub fn remove(&self) -> Result<bool> {
        Ok(io::remove_file(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Unit;

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = FsFile::new(&NormalizedPath::new(dir.path()), "/fr/app/messages.json");
        let content = TranslationFile::new(vec![Unit::new("hello", "Hello", "Bonjour")]);

        assert!(!file.exists());
        assert_eq!(file.deserialize().unwrap(), None);

        file.write(&file.serialize(&content).unwrap()).unwrap();

        assert!(file.exists());
        assert_eq!(file.deserialize().unwrap(), Some(content));
        assert!(file.fingerprint().unwrap().unwrap().starts_with("sha256:"));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = FsFile::new(&NormalizedPath::new(dir.path()), "/fr/messages.toml");
        file.write(b"").unwrap();

        assert!(file.remove().unwrap());
        assert!(!file.remove().unwrap());
        assert_eq!(file.fingerprint().unwrap(), None);
    }
}
