//! The single physical byte-stream under a container.
//!
//! Writes always go through the cursor lock; the format assumes one
//! writer at a time. Reads prefer a positional read keyed by file
//! descriptor and offset, which needs no shared cursor and is safe for
//! any number of concurrent readers. The locked path is the portable
//! fallback, and the only path in write-capable sessions, which must be
//! able to read back data through the same handle they write with.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

/// Setting this environment variable (to any value) disables the
/// lock-free positional-read path, for platforms or filesystems where
/// pread semantics are unsafe.
pub const DISABLE_PREAD_ENV: &str = "PODARC_DISABLE_PREAD";

pub(crate) struct StreamFile {
    file: File,
    /// Guards the shared stream cursor used by writes and fallback reads.
    cursor: Mutex<()>,
    positional: bool,
}

impl StreamFile {
    /// Create (or truncate) a writable stream.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file, true))
    }

    /// Open an existing stream.
    pub fn open(path: &Path, writable: bool) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(writable).open(path)?;
        Ok(Self::new(file, writable))
    }

    fn new(file: File, writable: bool) -> Self {
        let disabled = std::env::var_os(DISABLE_PREAD_ENV).is_some();
        let positional = cfg!(unix) && !writable && !disabled;
        if disabled {
            debug!("positional reads disabled by {}", DISABLE_PREAD_ENV);
        }
        Self {
            file,
            cursor: Mutex::new(()),
            positional,
        }
    }

    pub fn len(&self) -> io::Result<u64> {
        self.file.metadata().map(|m| m.len())
    }

    pub fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        #[cfg(unix)]
        if self.positional {
            use std::os::unix::fs::FileExt;
            return self.file.read_exact_at(buf, offset);
        }

        let _cursor = self.cursor.lock();
        (&self.file).seek(SeekFrom::Start(offset))?;
        (&self.file).read_exact(buf)
    }

    pub fn write_all_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let _cursor = self.cursor.lock();
        (&self.file).seek(SeekFrom::Start(offset))?;
        (&self.file).write_all(buf)
    }

    /// Cut the file back to its logical length, so the trailer is the
    /// last thing in the stream.
    pub fn truncate(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}
