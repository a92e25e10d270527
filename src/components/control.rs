/*
 * PM Control File
 *
 * One open handle on the control file. Reads return a text snapshot of
 * every catalog register, one line each:
 *
 *   GPE0_STS        0x00000000
 *   GPE0_EN         0x00000010
 *
 * A read transaction renders the snapshot once, hands it out in as many
 * reads as the caller needs, then answers one empty read (EOF) and rearms.
 * A `cat` of the file therefore sees exactly one snapshot, and the next
 * `cat` on the same handle sees fresh values.
 *
 * Writes are control commands (see `command`).
 */

use core::fmt::{self, Write};

use heapless::Vec;
use spin::Mutex;

use super::command::CommandDispatcher;
use crate::drivers::pm::accessor::RegisterAccessor;
use crate::drivers::pm::registers::RegisterTable;
use crate::io::device::{Device, Errno, S_IFREG, Stat};
use crate::io::PortBus;

/// Upper bound on a rendered snapshot, in bytes.
pub const SNAPSHOT_CAPACITY: usize = 512;

/// Where a handle is in its read transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing rendered; the next read renders.
    NotStarted,
    /// Snapshot rendered, bytes left to deliver.
    Rendered,
    /// Every byte delivered; the next read reports EOF.
    Drained,
}

/// Fixed-capacity byte sink that keeps whatever fits.
struct Truncating<'a, const N: usize>(&'a mut Vec<u8, N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = N - self.0.len();
        let take = s.len().min(room);
        // Cannot fail: `take` fits the remaining capacity.
        let _ = self.0.extend_from_slice(&s.as_bytes()[..take]);
        if take < s.len() { Err(fmt::Error) } else { Ok(()) }
    }
}

/// Per-handle read state.
#[derive(Debug)]
pub struct ControlSession {
    phase: Phase,
    buffer: Vec<u8, SNAPSHOT_CAPACITY>,
    cursor: usize,
}

impl ControlSession {
    pub const fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Serve one read request into `out`; 0 means end of data.
    ///
    /// An empty `out` returns 0 without moving the state machine.
    pub fn read<B: PortBus>(
        &mut self,
        accessor: &RegisterAccessor<'_, B>,
        table: &RegisterTable,
        out: &mut [u8],
    ) -> usize {
        if out.is_empty() {
            return 0;
        }

        if self.phase == Phase::NotStarted {
            self.render(accessor, table);
        }

        if self.phase == Phase::Drained {
            self.phase = Phase::NotStarted;
            return 0;
        }

        let pending = &self.buffer[self.cursor..];
        let count = pending.len().min(out.len());
        out[..count].copy_from_slice(&pending[..count]);
        self.cursor += count;

        if self.cursor == self.buffer.len() {
            self.phase = Phase::Drained;
        }
        count
    }

    fn render<B: PortBus>(&mut self, accessor: &RegisterAccessor<'_, B>, table: &RegisterTable) {
        self.buffer.clear();
        self.cursor = 0;

        let mut sink = Truncating(&mut self.buffer);
        for reg in table.all() {
            let value = accessor.read(reg);
            if writeln!(sink, "{:<15} 0x{:08x}", reg.name, value).is_err() {
                log::debug!("pm: snapshot truncated at {} bytes", SNAPSHOT_CAPACITY);
                break;
            }
        }
        self.phase = if self.buffer.is_empty() {
            Phase::Drained
        } else {
            Phase::Rendered
        };
    }
}

impl Default for ControlSession {
    fn default() -> Self {
        Self::new()
    }
}

/// An open control file handle.
pub struct ControlFile<'a, 'r, B: PortBus> {
    accessor: &'a RegisterAccessor<'r, B>,
    table: &'static RegisterTable,
    session: Mutex<ControlSession>,
}

impl<'a, 'r, B: PortBus> ControlFile<'a, 'r, B> {
    pub fn new(accessor: &'a RegisterAccessor<'r, B>, table: &'static RegisterTable) -> Self {
        Self {
            accessor,
            table,
            session: Mutex::new(ControlSession::new()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.lock().phase()
    }
}

impl<B: PortBus> Device for ControlFile<'_, '_, B> {
    fn read(&self, buf: &mut [u8]) -> Result<usize, Errno> {
        Ok(self.session.lock().read(self.accessor, self.table, buf))
    }

    fn write(&self, buf: &[u8]) -> Result<usize, Errno> {
        Ok(CommandDispatcher::new(self.accessor, self.table).dispatch(buf).consumed)
    }

    fn ioctl(&self, _request: u32, _arg: usize) -> Result<i32, Errno> {
        Err(Errno::ENOTTY)
    }

    fn stat(&self) -> Stat {
        Stat {
            st_mode: S_IFREG | 0o644, // Regular file, rw-r--r--
            ..Stat::default()
        }
    }
}
