/*
 * Device Abstraction Layer
 *
 * The file-like seam between this driver and whatever exposes it to user
 * space (a procfs entry, a devfs node, a VFS server). The host creates the
 * file and owns its lifecycle; the driver only answers read/write/ioctl on
 * an already-open handle.
 */

use core::fmt;

/// Open-handle operations for a character or pseudo file.
pub trait Device: Send + Sync {
    /// Read up to buf.len() bytes into buf
    ///
    /// Returns the number of bytes read; 0 means end of data.
    fn read(&self, buf: &mut [u8]) -> Result<usize, Errno>;

    /// Write buf.len() bytes from buf
    ///
    /// Returns the number of bytes consumed, or an error.
    fn write(&self, buf: &[u8]) -> Result<usize, Errno>;

    /// Device control operation (ioctl)
    fn ioctl(&self, request: u32, arg: usize) -> Result<i32, Errno>;

    /// Get device metadata
    fn stat(&self) -> Stat;

    /// Seek to position (default: not seekable)
    fn seek(&self, _offset: i64, _whence: i32) -> Result<i64, Errno> {
        Err(Errno::ESPIPE)
    }
}

/// POSIX errno values
///
/// Subset of standard POSIX error codes returned across the device seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    EIO = 5,     // I/O error
    EBUSY = 16,  // Device or resource busy
    ENODEV = 19, // No such device
    EINVAL = 22, // Invalid argument
    ENOTTY = 25, // Not a typewriter
    ENOSPC = 28, // No space left on device
    ESPIPE = 29, // Illegal seek
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Errno::EIO => "I/O error",
            Errno::EBUSY => "device or resource busy",
            Errno::ENODEV => "no such device",
            Errno::EINVAL => "invalid argument",
            Errno::ENOTTY => "inappropriate ioctl for device",
            Errno::ENOSPC => "no space left on device",
            Errno::ESPIPE => "illegal seek",
        };
        write!(f, "{} (errno {})", text, *self as i32)
    }
}

/// Minimal stat structure
///
/// Subset of POSIX struct stat, focusing on st_mode for type checking.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub st_mode: u32,    // File type and mode
    pub st_size: u64,    // File size in bytes
    pub st_blksize: u64, // Block size for I/O
    pub st_blocks: u64,  // Number of 512B blocks allocated
}

// File type constants (POSIX)
pub const S_IFMT: u32 = 0o170000; // File type mask
pub const S_IFREG: u32 = 0o100000; // Regular file

/// Check if mode indicates a regular file
#[inline]
#[allow(non_snake_case)]
pub fn S_ISREG(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFREG
}
