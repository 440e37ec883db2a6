//! Credential file access

use std::fs;
use std::io;
use std::path::Path;

/// Reads credential files (signing keys) in full
pub trait CredentialReader: Send + Sync {
    /// Read the whole file; the handle is closed before returning
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads credentials from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCredentialReader;

impl CredentialReader for FsCredentialReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}
