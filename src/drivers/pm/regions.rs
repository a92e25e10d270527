/*
 * I/O Port Region Reservations
 *
 * Exclusive ownership of ranges of the 16-bit I/O port space. A driver
 * asks for its window before touching any port in it and gives it back on
 * shutdown; a second request for an overlapping range fails with `Busy`.
 *
 * The reservation is an RAII token (`IoRegion`): dropping it returns the
 * range, so every early-return path during startup unwinds correctly
 * without an explicit cleanup label.
 */

use core::fmt;

use heapless::Vec;
use spin::Mutex;

use crate::io::Errno;

/// Highest addressable port + 1.
pub const PORT_SPACE_END: u32 = 0x1_0000;

/// Maximum number of simultaneously held reservations.
pub const MAX_REGIONS: usize = 16;

/// Why a reservation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// Some part of the range is already owned.
    Busy { start: u32, len: u32, owner: &'static str },
    /// Empty range, or a range running past the end of port space.
    InvalidRange { start: u32, len: u32 },
    /// The reservation table has no free slot.
    TableFull,
}

impl RegionError {
    pub fn errno(&self) -> Errno {
        match self {
            RegionError::Busy { .. } => Errno::EBUSY,
            RegionError::InvalidRange { .. } => Errno::EINVAL,
            RegionError::TableFull => Errno::ENOSPC,
        }
    }
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Busy { start, len, owner } => write!(
                f,
                "ports 0x{:04x}-0x{:04x} already owned by {}",
                start,
                start + len - 1,
                owner
            ),
            RegionError::InvalidRange { start, len } => {
                write!(f, "invalid port range 0x{:x}+{}", start, len)
            }
            RegionError::TableFull => write!(f, "no free port reservation slot"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Reservation {
    start: u32,
    len: u32,
    owner: &'static str,
}

impl Reservation {
    fn overlaps(&self, start: u32, len: u32) -> bool {
        start < self.start + self.len && self.start < start + len
    }
}

/// Table of reserved port ranges.
pub struct PortRegions {
    held: Mutex<Vec<Reservation, MAX_REGIONS>>,
}

/// System-wide port reservations.
pub static IO_REGIONS: PortRegions = PortRegions::new();

impl PortRegions {
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(Vec::new()),
        }
    }

    /// Reserve `[start, start + len)` for `owner`.
    ///
    /// # Arguments
    ///
    /// * `start` - First port of the range.
    /// * `len` - Number of ports.
    /// * `owner` - Name recorded against the range, reported to later
    ///   requesters that collide with it.
    ///
    /// # Returns
    ///
    /// The reservation token, or why it could not be granted.
    pub fn request(
        &self,
        start: u32,
        len: u32,
        owner: &'static str,
    ) -> Result<IoRegion<'_>, RegionError> {
        let end = start.checked_add(len);
        if len == 0 || end.is_none_or(|end| end > PORT_SPACE_END) {
            return Err(RegionError::InvalidRange { start, len });
        }

        let mut held = self.held.lock();
        if let Some(other) = held.iter().find(|r| r.overlaps(start, len)) {
            return Err(RegionError::Busy {
                start: other.start,
                len: other.len,
                owner: other.owner,
            });
        }
        held.push(Reservation { start, len, owner })
            .map_err(|_| RegionError::TableFull)?;

        log::debug!("ioport: 0x{:04x}-0x{:04x} reserved by {}", start, start + len - 1, owner);
        Ok(IoRegion {
            regions: self,
            start,
            len,
        })
    }

    /// Whether `port` lies inside any held reservation.
    pub fn is_reserved(&self, port: u32) -> bool {
        self.held.lock().iter().any(|r| r.overlaps(port, 1))
    }

    /// Owner of the reservation covering `port`, if any.
    pub fn owner_of(&self, port: u32) -> Option<&'static str> {
        self.held.lock().iter().find(|r| r.overlaps(port, 1)).map(|r| r.owner)
    }

    fn release_range(&self, start: u32, len: u32) {
        let mut held = self.held.lock();
        if let Some(pos) = held.iter().position(|r| r.start == start && r.len == len) {
            let r = held.swap_remove(pos);
            let last = r.start + r.len - 1;
            log::debug!("ioport: 0x{:04x}-0x{:04x} released by {}", r.start, last, r.owner);
        }
    }
}

impl Default for PortRegions {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive ownership of a port range. Released on drop.
#[must_use = "dropping an IoRegion releases the ports immediately"]
pub struct IoRegion<'a> {
    regions: &'a PortRegions,
    start: u32,
    len: u32,
}

impl IoRegion<'_> {
    /// First port of the range.
    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether a `width`-byte access at `port` stays inside the range.
    pub fn contains(&self, port: u32, width: u32) -> bool {
        port >= self.start && port.saturating_add(width) <= self.start + self.len
    }

    /// Give the range back.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for IoRegion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoRegion")
            .field("start", &format_args!("0x{:04x}", self.start))
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for IoRegion<'_> {
    fn drop(&mut self) {
        self.regions.release_range(self.start, self.len);
    }
}

/// Release whatever `slot` holds. Does nothing when it is empty.
pub fn release(slot: &mut Option<IoRegion<'_>>) {
    if let Some(region) = slot.take() {
        region.release();
    }
}
