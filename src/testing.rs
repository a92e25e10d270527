//! In-memory stand-ins for the port bus and PCI config space.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::drivers::pci::ConfigSpace;
use crate::io::{Errno, PortBus};

/// Port space backed by a map. Unwritten ports read as 0.
///
/// Clones share the same ports, so a test can keep one handle and give
/// the other to an accessor.
#[derive(Clone, Default)]
pub struct FakePorts {
    ports: Arc<Mutex<HashMap<u16, u32>>>,
    accesses: Arc<AtomicUsize>,
    race_window: bool,
}

impl FakePorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield the thread between every read and the following write, so an
    /// unserialized read-modify-write would lose updates.
    pub fn with_race_window() -> Self {
        Self {
            race_window: true,
            ..Self::default()
        }
    }

    pub fn get(&self, port: u16) -> u32 {
        self.ports.lock().unwrap().get(&port).copied().unwrap_or(0)
    }

    pub fn set(&self, port: u16, value: u32) {
        self.ports.lock().unwrap().insert(port, value);
    }

    /// Number of bus reads and writes issued so far.
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }
}

impl PortBus for FakePorts {
    fn read_u32(&mut self, port: u16) -> u32 {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        let value = self.get(port);
        if self.race_window {
            std::thread::yield_now();
        }
        value
    }

    fn write_u32(&mut self, port: u16, value: u32) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.set(port, value);
    }
}

/// LPC bridge config space with settable dwords.
#[derive(Default)]
pub struct FakeConfig {
    dwords: HashMap<u8, u32>,
    fail_at: Option<u8>,
}

impl FakeConfig {
    /// An LPC bridge with ACPI decode on and PMBASE at `pm_base`.
    pub fn lpc(pm_base: u32) -> Self {
        let mut config = Self::default();
        config.dwords.insert(0x44, 0x80);
        config.dwords.insert(0x40, pm_base);
        config
    }

    pub fn set(&mut self, offset: u8, value: u32) {
        self.dwords.insert(offset, value);
    }

    /// Make reads of `offset` fail with `EIO`.
    pub fn fail_at(&mut self, offset: u8) {
        self.fail_at = Some(offset);
    }
}

impl ConfigSpace for FakeConfig {
    fn read_config_dword(&mut self, offset: u8) -> Result<u32, Errno> {
        if self.fail_at == Some(offset) {
            return Err(Errno::EIO);
        }
        Ok(self.dwords.get(&offset).copied().unwrap_or(0))
    }
}
