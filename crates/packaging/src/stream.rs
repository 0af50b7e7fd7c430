use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use mailpack_message::{FileDescriptor, PackageRecord, SummaryRecord};

use crate::checksum::{checksum_bytes, checksum_open_file};
use crate::{DEFAULT_PACKAGE_SIZE, PackagingError};

/// One unit a [`PackageStream`] yields, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageUnit {
    /// The whole file in one payload; only unit of a single-message transfer.
    Single { payload: Vec<u8> },
    /// One package of a split transfer.
    Part {
        record: PackageRecord,
        payload: Vec<u8>,
    },
    /// Closes a split transfer; always the last unit.
    Summary { record: SummaryRecord },
}

// ---------------------------------------------------------------------------
// PackageStream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Single,
    Split,
}

/// Reads a file as a lazy sequence of packages.
///
/// Opening the stream makes one full pass to checksum the file and measure
/// it; the byte count of that pass is the descriptor's total size even if
/// the file changes on disk afterwards. Package reads then restart from the
/// beginning, one package buffered at a time.
pub struct PackageStream {
    file: std::fs::File,
    descriptor: FileDescriptor,
    max_package_size: u64,
    mode: Mode,
    next_index: u32,
    finished: bool,
}

impl PackageStream {
    /// Opens `path` for packaged reading.
    ///
    /// If `max_package_size` is 0, [`DEFAULT_PACKAGE_SIZE`] (5 MiB) is used.
    /// Empty files and non-files are refused.
    pub fn open(path: &Path, max_package_size: u64) -> Result<Self, PackagingError> {
        let max_package_size = if max_package_size == 0 {
            DEFAULT_PACKAGE_SIZE
        } else {
            max_package_size
        };

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(PackagingError::NotAFile(path.display().to_string()));
        }
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(PackagingError::NotAFile(path.display().to_string())),
        };

        let mut file = std::fs::File::open(path)?;
        let (checksum, total_size) = checksum_open_file(&mut file)?;
        if total_size == 0 {
            return Err(PackagingError::EmptyFile(path.display().to_string()));
        }
        file.seek(SeekFrom::Start(0))?;

        // Strictly below the limit goes single; exactly at the limit splits.
        let mode = if total_size < max_package_size {
            Mode::Single
        } else {
            Mode::Split
        };

        Ok(Self {
            file,
            descriptor: FileDescriptor::new(file_name, total_size, checksum),
            max_package_size,
            mode,
            next_index: 0,
            finished: false,
        })
    }

    /// Identity and integrity record for the file being streamed.
    pub fn descriptor(&self) -> &FileDescriptor {
        &self.descriptor
    }

    /// Whether the file travels as parts plus summary.
    pub fn is_split(&self) -> bool {
        self.mode == Mode::Split
    }

    /// Number of messages this stream is expected to yield.
    ///
    /// For display only. The authoritative count is the summary record,
    /// which reflects the packages actually emitted.
    pub fn estimated_message_count(&self) -> u64 {
        match self.mode {
            Mode::Single => 1,
            Mode::Split => self.descriptor.total_size.div_ceil(self.max_package_size) + 1,
        }
    }

    /// Reads the next unit. Returns `None` once the stream is exhausted.
    ///
    /// Split streams end on an empty read, not on the measured size, so a
    /// file that shrank or grew mid-transfer still terminates cleanly; the
    /// summary then counts the parts actually produced.
    pub fn next_unit(&mut self) -> Result<Option<PackageUnit>, PackagingError> {
        if self.finished {
            return Ok(None);
        }
        match self.mode {
            Mode::Single => {
                let mut payload = Vec::with_capacity(self.descriptor.total_size as usize);
                self.file.read_to_end(&mut payload)?;
                self.finished = true;
                Ok(Some(PackageUnit::Single { payload }))
            }
            Mode::Split => {
                let payload = self.read_package()?;
                if payload.is_empty() {
                    self.finished = true;
                    return Ok(Some(PackageUnit::Summary {
                        record: SummaryRecord {
                            package_count: self.next_index,
                        },
                    }));
                }
                let record = PackageRecord {
                    index: self.next_index,
                    size: payload.len() as u64,
                    checksum: checksum_bytes(&payload),
                };
                self.next_index += 1;
                Ok(Some(PackageUnit::Part { record, payload }))
            }
        }
    }

    /// Fills a package buffer, looping over short reads.
    fn read_package(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; self.max_package_size as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}
