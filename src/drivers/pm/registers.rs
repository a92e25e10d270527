/*
 * ICH7 PM Register Catalog
 *
 * The fixed set of registers this driver exposes by name. The PM block is
 * located through the PM_BASE register of the LPC bridge's PCI config
 * space; register offsets inside it come from the ICH7 datasheet
 * (chapter 10.10, "Power Management I/O Registers").
 *
 * The catalog is compiled in and never changes at runtime. Its order is
 * the order registers appear in the control file snapshot.
 */

/// LPC config register holding the PM I/O block base (PMBASE).
pub const PM_BASE: u8 = 0x40;
/// LPC config register holding the GPIO I/O block base (GPIOBASE).
pub const GPIO_BASE: u8 = 0x48;

/// General Purpose Event 0 status.
pub const GPE0_STS: u32 = 0x28;
/// General Purpose Event 0 enables.
pub const GPE0_EN: u32 = 0x2c;

/// Which I/O block a register's offset is relative to.
///
/// Each variant is named after the LPC config register that holds the
/// block's base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterGroup {
    /// Power-management block, based at PMBASE.
    PmBase,
    /// GPIO block, based at GPIOBASE. This driver does not claim the GPIO
    /// window, so registers in this group cannot be addressed.
    GpioBase,
}

impl RegisterGroup {
    /// Offset of the base-address register in LPC config space.
    pub const fn config_offset(self) -> u8 {
        match self {
            RegisterGroup::PmBase => PM_BASE,
            RegisterGroup::GpioBase => GPIO_BASE,
        }
    }
}

/// One named register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub group: RegisterGroup,
    pub offset: u32,
}

impl RegisterDescriptor {
    pub const fn new(name: &'static str, group: RegisterGroup, offset: u32) -> Self {
        Self { name, group, offset }
    }
}

/// Ordered, immutable register catalog.
#[derive(Debug)]
pub struct RegisterTable {
    registers: &'static [RegisterDescriptor],
}

impl RegisterTable {
    pub const fn new(registers: &'static [RegisterDescriptor]) -> Self {
        Self { registers }
    }

    /// Find a register by exact, case-sensitive name.
    ///
    /// Unknown names are not an error: callers treat `None` as "nothing
    /// to do".
    pub fn lookup(&self, name: &[u8]) -> Option<&'static RegisterDescriptor> {
        let found = self.registers.iter().find(|reg| reg.name.as_bytes() == name);
        if let Some(reg) = found {
            log::debug!("pm: found reg {}", reg.name);
        }
        found
    }

    /// Every register, in snapshot order.
    pub fn all(&self) -> &'static [RegisterDescriptor] {
        self.registers
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

static ICH7_REGISTERS: [RegisterDescriptor; 2] = [
    RegisterDescriptor::new("GPE0_STS", RegisterGroup::PmBase, GPE0_STS),
    RegisterDescriptor::new("GPE0_EN", RegisterGroup::PmBase, GPE0_EN),
];

/// The registers exposed through the control file.
pub static PM_REGISTERS: RegisterTable = RegisterTable::new(&ICH7_REGISTERS);
