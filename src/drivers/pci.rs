/*
 * PCI Configuration Space Access
 *
 * The PM driver needs two dwords from the LPC bridge's configuration space
 * (ACPI_CNTL and PMBASE). Locating the bridge is the host's job; once it
 * knows the bus/device/function it hands the driver a `ConfigSpace`.
 *
 * `CamConfigSpace` implements configuration mechanism #1: write the target
 * address to CONFIG_ADDRESS (0xCF8), then read CONFIG_DATA (0xCFC).
 */

use bitflags::bitflags;

use crate::io::Errno;

/// CONFIG_ADDRESS port of configuration mechanism #1.
pub const CONFIG_ADDRESS: u16 = 0xcf8;
/// CONFIG_DATA port of configuration mechanism #1.
pub const CONFIG_DATA: u16 = 0xcfc;

bitflags! {
    /// ACPI Control register (LPC config offset 0x44)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AcpiCntl: u32 {
        /// SCI IRQ routing select (3-bit field)
        const SCI_IRQ_SEL = 0b111;
        /// ACPI I/O decode enable: PMBASE is only meaningful when set
        const ACPI_EN = 1 << 7;
    }
}

/// Dword reads from one PCI function's configuration space.
pub trait ConfigSpace {
    /// Read the dword at `offset` (rounded down to 4-byte alignment).
    fn read_config_dword(&mut self, offset: u8) -> Result<u32, Errno>;
}

/// One PCI function reached through ports 0xCF8/0xCFC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamConfigSpace {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl CamConfigSpace {
    /// The usual home of the ICH7 LPC bridge: 00:1f.0
    pub const ICH7_LPC: CamConfigSpace = CamConfigSpace::new(0, 0x1f, 0);

    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self { bus, device, function }
    }

    /// CONFIG_ADDRESS value selecting `offset` of this function.
    pub fn address(&self, offset: u8) -> u32 {
        1 << 31
            | (self.bus as u32) << 16
            | ((self.device & 0x1f) as u32) << 11
            | ((self.function & 0x07) as u32) << 8
            | (offset & 0xfc) as u32
    }
}

#[cfg(target_arch = "x86_64")]
impl ConfigSpace for CamConfigSpace {
    fn read_config_dword(&mut self, offset: u8) -> Result<u32, Errno> {
        use x86_64::instructions::port::Port;

        let mut address: Port<u32> = Port::new(CONFIG_ADDRESS);
        let mut data: Port<u32> = Port::new(CONFIG_DATA);
        // Safety: 0xCF8/0xCFC are the architectural config mechanism ports.
        let value = unsafe {
            address.write(self.address(offset));
            data.read()
        };
        Ok(value)
    }
}
