/*
 * ICH7 Power-Management Driver
 *
 * Binds to the ICH7 LPC bridge's PM I/O block and exposes a handful of its
 * registers through a text control file.
 *
 * Startup (`probe`):
 * 1. Check ACPI_CNTL: PMBASE decodes only while ACPI_EN is set
 * 2. Read PMBASE and align it to the 64-byte block boundary
 * 3. Claim the 128-port window exclusively
 * 4. Build the register accessor on top of the claimed window
 *
 * Every step that acquired something gives it back if a later step fails.
 * Shutdown (`remove`) releases the window.
 */

use core::fmt;

use crate::components::{CommandDispatcher, ControlFile};
use crate::drivers::pci::{AcpiCntl, ConfigSpace};
use crate::io::{Errno, PortBus};

pub mod accessor;
pub mod regions;
pub mod registers;

pub use accessor::{AccessError, RegisterAccessor};
pub use regions::{IoRegion, PortRegions, RegionError, IO_REGIONS};
pub use registers::{PM_REGISTERS, RegisterDescriptor, RegisterGroup, RegisterTable};

/// Driver name, also the owner recorded against the port window.
pub const DRIVER_NAME: &str = "ich7_pm";

/// LPC config register: ACPI Control.
pub const ACPI_CNTL: u8 = 0x44;

/// PMBASE bits that hold the block address (64-byte aligned, 16-bit I/O).
pub const PM_BASE_MASK: u32 = 0x0000_ffc0;

/// Ports claimed starting at PMBASE.
pub const PM_WINDOW_LEN: u32 = 128;

/// Startup settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmConfig {
    /// Name the port window is reserved under.
    pub owner: &'static str,
    /// Number of ports to reserve from PMBASE.
    pub window_len: u32,
}

impl PmConfig {
    pub const DEFAULT: PmConfig = PmConfig {
        owner: DRIVER_NAME,
        window_len: PM_WINDOW_LEN,
    };
}

impl Default for PmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why the driver did not come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// The LPC ACPI block is not enabled, so PMBASE is not decoded.
    AcpiDisabled,
    /// Config space could not be read.
    Config(Errno),
    /// The PM window could not be claimed.
    Region(RegionError),
}

impl ProbeError {
    pub fn errno(&self) -> Errno {
        match self {
            ProbeError::AcpiDisabled => Errno::ENODEV,
            ProbeError::Config(errno) => *errno,
            ProbeError::Region(err) => err.errno(),
        }
    }
}

impl From<RegionError> for ProbeError {
    fn from(err: RegionError) -> Self {
        ProbeError::Region(err)
    }
}

impl From<Errno> for ProbeError {
    fn from(errno: Errno) -> Self {
        ProbeError::Config(errno)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::AcpiDisabled => write!(f, "the LPC ACPI block has not been enabled"),
            ProbeError::Config(errno) => write!(f, "unable to read PMBASE: {}", errno),
            ProbeError::Region(err) => write!(f, "unable to register PM IO addresses: {}", err),
        }
    }
}

/// A bound PM block.
pub struct PmDriver<'r, B: PortBus> {
    accessor: RegisterAccessor<'r, B>,
    table: &'static RegisterTable,
}

impl<'r, B: PortBus> PmDriver<'r, B> {
    /// Bring the driver up on the LPC bridge behind `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - The LPC bridge's PCI configuration space.
    /// * `regions` - Port reservation table to claim the PM window from.
    /// * `bus` - Port bus the registers are reached through.
    /// * `settings` - Window owner and size.
    ///
    /// # Returns
    ///
    /// The running driver, or the first startup step that failed. Nothing
    /// stays reserved on failure.
    pub fn probe<C: ConfigSpace>(
        config: &mut C,
        regions: &'r PortRegions,
        bus: B,
        settings: &PmConfig,
    ) -> Result<Self, ProbeError> {
        let result = Self::bring_up(config, regions, bus, settings);
        if let Err(err) = &result {
            log::error!("ICH7: ERROR: {}", err);
        }
        result
    }

    fn bring_up<C: ConfigSpace>(
        config: &mut C,
        regions: &'r PortRegions,
        bus: B,
        settings: &PmConfig,
    ) -> Result<Self, ProbeError> {
        let acpi_cntl = AcpiCntl::from_bits_truncate(config.read_config_dword(ACPI_CNTL)?);
        log::debug!("ICH7: ACPI_CNTL {:x}", acpi_cntl.bits());
        // Bit 7 is the ACPI decode enable. Bits 2:0 select the SCI IRQ and
        // say nothing about whether PMBASE decodes.
        if !acpi_cntl.contains(AcpiCntl::ACPI_EN) {
            return Err(ProbeError::AcpiDisabled);
        }

        let io_base = discover_io_base(config)?;
        log::debug!("ICH7: PMBASE {:x}", io_base);

        let region = regions.request(io_base, settings.window_len, settings.owner)?;
        let driver = Self {
            accessor: RegisterAccessor::new(region, bus),
            table: &PM_REGISTERS,
        };
        driver.init();

        log::info!(
            "{}: PM block at 0x{:04x}, {} registers",
            settings.owner,
            io_base,
            driver.table.len()
        );
        Ok(driver)
    }

    /// Program the PM block after the window is claimed. The exposed
    /// registers need no setup, so this only records their power-on values.
    fn init(&self) {
        for reg in self.table.all() {
            log::debug!("ICH7: {} = 0x{:08x}", reg.name, self.accessor.read(reg));
        }
    }

    pub fn accessor(&self) -> &RegisterAccessor<'r, B> {
        &self.accessor
    }

    pub fn table(&self) -> &'static RegisterTable {
        self.table
    }

    /// A dispatcher for control commands.
    pub fn dispatcher(&self) -> CommandDispatcher<'_, 'r, B> {
        CommandDispatcher::new(&self.accessor, self.table)
    }

    /// Open a new handle on the control file. Dropping it closes it.
    pub fn open(&self) -> ControlFile<'_, 'r, B> {
        ControlFile::new(&self.accessor, self.table)
    }

    /// Unbind: release the PM window and hand back the bus.
    pub fn remove(self) -> B {
        let (region, bus) = self.accessor.into_parts();
        log::info!("ICH7: releasing PM IO addresses 0x{:04x}", region.start());
        region.release();
        bus
    }
}

/// Read PMBASE and reduce it to the block's port address.
pub fn discover_io_base<C: ConfigSpace>(config: &mut C) -> Result<u32, Errno> {
    let raw = config.read_config_dword(RegisterGroup::PmBase.config_offset())?;
    Ok(raw & PM_BASE_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Device;
    use crate::testing::{FakeConfig, FakePorts};

    #[test]
    fn pm_base_is_masked_to_the_block() {
        // Bit 0 is the I/O space indicator; bits 31:16 are reserved.
        let mut config = FakeConfig::lpc(0xdead_0401);
        assert_eq!(discover_io_base(&mut config), Ok(0x400));

        config.set(0x40, 0x0000_047f);
        assert_eq!(discover_io_base(&mut config), Ok(0x440));
    }

    #[test]
    fn probe_claims_the_window() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x401);
        let driver =
            PmDriver::probe(&mut config, &regions, FakePorts::new(), &PmConfig::DEFAULT).unwrap();

        assert_eq!(driver.accessor().io_base(), 0x400);
        assert_eq!(regions.owner_of(0x400), Some(DRIVER_NAME));
        assert_eq!(regions.owner_of(0x47f), Some(DRIVER_NAME));
        assert_eq!(regions.owner_of(0x480), None);

        driver.remove();
        assert!(!regions.is_reserved(0x400));
    }

    #[test]
    fn probe_fails_without_acpi_decode() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x401);

        // A routed SCI IRQ without the enable bit does not decode PMBASE.
        for acpi_cntl in [0x00, 0x01, 0x07] {
            config.set(ACPI_CNTL, acpi_cntl);
            let err = PmDriver::probe(&mut config, &regions, FakePorts::new(), &PmConfig::DEFAULT)
                .err()
                .unwrap();
            assert_eq!(err, ProbeError::AcpiDisabled);
            assert_eq!(err.errno(), Errno::ENODEV);
            assert!(!regions.is_reserved(0x400));
        }
    }

    #[test]
    fn probe_reports_config_read_failure() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x401);
        config.fail_at(0x40);

        let err = PmDriver::probe(&mut config, &regions, FakePorts::new(), &PmConfig::DEFAULT)
            .err()
            .unwrap();
        assert_eq!(err, ProbeError::Config(Errno::EIO));
        assert!(!regions.is_reserved(0x400));
    }

    #[test]
    fn probe_fails_when_the_window_is_taken() {
        let regions = PortRegions::new();
        let _acpi = regions.request(0x404, 4, "acpi").unwrap();
        let mut config = FakeConfig::lpc(0x401);
        let ports = FakePorts::new();

        let err = PmDriver::probe(&mut config, &regions, ports.clone(), &PmConfig::DEFAULT)
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::Region(RegionError::Busy { owner: "acpi", .. })));
        assert_eq!(err.errno(), Errno::EBUSY);
        assert_eq!(regions.owner_of(0x400), None);
        assert_eq!(ports.access_count(), 0);
    }

    #[test]
    fn second_probe_is_busy_until_remove() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x401);
        let settings = PmConfig::DEFAULT;
        let first = PmDriver::probe(&mut config, &regions, FakePorts::new(), &settings).unwrap();

        assert!(PmDriver::probe(&mut config, &regions, FakePorts::new(), &settings).is_err());
        first.remove();
        assert!(PmDriver::probe(&mut config, &regions, FakePorts::new(), &settings).is_ok());
    }

    #[test]
    fn control_file_end_to_end() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x881);
        let ports = FakePorts::new();
        let driver =
            PmDriver::probe(&mut config, &regions, ports.clone(), &PmConfig::DEFAULT).unwrap();

        let file = driver.open();
        assert_eq!(file.write(b"set GPE0_EN 0x10\n").unwrap(), 17);
        assert_eq!(file.write(b"setbit GPE0_STS 31 1\n").unwrap(), 21);
        assert_eq!(ports.get(0x8ac), 0x10);
        assert_eq!(ports.get(0x8a8), 0x8000_0000);

        let mut buf = [0u8; 512];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            b"GPE0_STS        0x80000000\nGPE0_EN         0x00000010\n"
        );
        assert_eq!(file.read(&mut buf).unwrap(), 0);

        let done = driver.dispatcher().dispatch(b"set NOPE 1");
        assert_eq!(done.consumed, 10);
        drop(file);

        driver.remove();
        assert!(!regions.is_reserved(0x880));
    }

    #[test]
    fn custom_window_size() {
        let regions = PortRegions::new();
        let mut config = FakeConfig::lpc(0x400);
        let settings = PmConfig {
            owner: "pm-test",
            window_len: 64,
        };
        let driver = PmDriver::probe(&mut config, &regions, FakePorts::new(), &settings).unwrap();
        assert_eq!(regions.owner_of(0x43f), Some("pm-test"));
        assert_eq!(regions.owner_of(0x440), None);
        assert_eq!(driver.table().len(), 2);
        driver.remove();
    }
}
