/*
 * PM Register Accessor
 *
 * Serialized read / write / bit-set operations on catalog registers.
 *
 * One lock guards the whole port bus, not one lock per register: a
 * read-modify-write on GPE0_EN excludes every other access to every PM
 * register for its duration. Critical sections are one or two port
 * operations, never more.
 *
 * The accessor owns the I/O window reservation. It cannot be built without
 * one, so no port in the PM block is touched before the window is claimed.
 */

use core::fmt;

use spin::Mutex;

use super::regions::IoRegion;
use super::registers::{RegisterDescriptor, RegisterGroup};
use crate::io::PortBus;

/// Width of every PM register access, in bytes.
const REGISTER_WIDTH: u32 = 4;

/// A register operation that was refused. The hardware is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The descriptor's group has no base in this accessor, or its port
    /// falls outside the reserved window.
    InvalidGroup(RegisterGroup),
    /// Bit index outside `0..32`.
    BitOutOfRange(u32),
    /// Bit value other than 0 or 1.
    ValueOutOfRange(u32),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::InvalidGroup(group) => write!(f, "no address for group {:?}", group),
            AccessError::BitOutOfRange(bit) => write!(f, "bit {} out of range", bit),
            AccessError::ValueOutOfRange(val) => write!(f, "bit value {} is not 0 or 1", val),
        }
    }
}

/// Serialized access to the PM register block.
pub struct RegisterAccessor<'r, B: PortBus> {
    region: IoRegion<'r>,
    bus: Mutex<B>,
}

impl<'r, B: PortBus> RegisterAccessor<'r, B> {
    /// Create an accessor for the block reserved by `region`.
    ///
    /// The region's first port is the PM I/O base.
    pub fn new(region: IoRegion<'r>, bus: B) -> Self {
        Self {
            region,
            bus: Mutex::new(bus),
        }
    }

    /// The PM I/O base every `PmBase` offset is added to.
    pub fn io_base(&self) -> u32 {
        self.region.start()
    }

    /// Compute the port backing `reg`.
    pub fn port_of(&self, reg: &RegisterDescriptor) -> Result<u16, AccessError> {
        let port = match reg.group {
            RegisterGroup::PmBase => self.io_base().checked_add(reg.offset),
            RegisterGroup::GpioBase => None,
        };
        port.filter(|&port| self.region.contains(port, REGISTER_WIDTH))
            .and_then(|port| u16::try_from(port).ok())
            .ok_or(AccessError::InvalidGroup(reg.group))
    }

    /// Read `reg`, or 0 when it cannot be addressed.
    pub fn read(&self, reg: &RegisterDescriptor) -> u32 {
        self.try_read(reg).unwrap_or(0)
    }

    /// Read `reg`, reporting why it cannot be addressed.
    pub fn try_read(&self, reg: &RegisterDescriptor) -> Result<u32, AccessError> {
        let port = self.port_of(reg)?;
        Ok(self.bus.lock().read_u32(port))
    }

    /// Write `value` to `reg`.
    pub fn write(&self, reg: &RegisterDescriptor, value: u32) -> Result<(), AccessError> {
        let port = self.port_of(reg)?;
        log::debug!("pm: writing 0x{:08x} to 0x{:04x}", value, port);
        self.bus.lock().write_u32(port, value);
        Ok(())
    }

    /// Set (`value == 1`) or clear (`value == 0`) one bit of `reg`.
    ///
    /// The read and the write-back happen under one lock hold, so a
    /// concurrent `set_bit` on another bit of the same register cannot be
    /// lost.
    ///
    /// # Arguments
    ///
    /// * `reg` - Register to modify.
    /// * `bit` - Bit index, `0..32`.
    /// * `value` - New bit value, 0 or 1.
    pub fn set_bit(
        &self,
        reg: &RegisterDescriptor,
        bit: u32,
        value: u32,
    ) -> Result<(), AccessError> {
        log::debug!("pm: setting reg {} bit {} to {}", reg.name, bit, value);

        if bit >= u32::BITS {
            return Err(AccessError::BitOutOfRange(bit));
        }
        if value > 1 {
            return Err(AccessError::ValueOutOfRange(value));
        }
        let port = self.port_of(reg)?;

        let mut bus = self.bus.lock();
        let current = bus.read_u32(port);
        let updated = if value == 1 {
            current | (1 << bit)
        } else {
            current & !(1 << bit)
        };
        bus.write_u32(port, updated);
        Ok(())
    }

    /// Read one bit of `reg`.
    pub fn get_bit(&self, reg: &RegisterDescriptor, bit: u32) -> Result<bool, AccessError> {
        if bit >= u32::BITS {
            return Err(AccessError::BitOutOfRange(bit));
        }
        Ok(self.try_read(reg)? & (1 << bit) != 0)
    }

    /// Give back the bus and the window reservation.
    pub fn into_parts(self) -> (IoRegion<'r>, B) {
        (self.region, self.bus.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::pm::regions::PortRegions;
    use crate::drivers::pm::registers::PM_REGISTERS;
    use crate::testing::FakePorts;

    use std::thread;

    const BASE: u32 = 0x400;

    fn window(regions: &PortRegions) -> IoRegion<'_> {
        regions.request(BASE, 128, "test").unwrap()
    }

    fn gpe0_en() -> &'static RegisterDescriptor {
        PM_REGISTERS.lookup(b"GPE0_EN").unwrap()
    }

    fn gpe0_sts() -> &'static RegisterDescriptor {
        PM_REGISTERS.lookup(b"GPE0_STS").unwrap()
    }

    #[test]
    fn ports_are_base_plus_offset() {
        let regions = PortRegions::new();
        let accessor = RegisterAccessor::new(window(&regions), FakePorts::new());
        assert_eq!(accessor.port_of(gpe0_sts()), Ok(0x428));
        assert_eq!(accessor.port_of(gpe0_en()), Ok(0x42c));
    }

    #[test]
    fn write_then_read_round_trips() {
        let regions = PortRegions::new();
        let ports = FakePorts::new();
        let accessor = RegisterAccessor::new(window(&regions), ports.clone());

        for reg in PM_REGISTERS.all() {
            for value in [0, 1, 0x10, 0x8000_0000, 0xdead_beef, u32::MAX] {
                accessor.write(reg, value).unwrap();
                assert_eq!(accessor.read(reg), value);
            }
        }
        assert_eq!(ports.get(0x42c), u32::MAX);
    }

    #[test]
    fn set_bit_touches_only_that_bit() {
        let regions = PortRegions::new();
        let accessor = RegisterAccessor::new(window(&regions), FakePorts::new());
        let reg = gpe0_en();

        for start in [0u32, u32::MAX, 0xa5a5_5a5a] {
            for bit in 0..32 {
                for value in 0..=1 {
                    accessor.write(reg, start).unwrap();
                    accessor.set_bit(reg, bit, value).unwrap();
                    let after = accessor.read(reg);
                    let mask = 1u32 << bit;
                    assert_eq!(after & !mask, start & !mask);
                    assert_eq!(after & mask != 0, value == 1);
                    assert_eq!(accessor.get_bit(reg, bit), Ok(value == 1));
                }
            }
        }
    }

    #[test]
    fn set_bit_rejects_bad_arguments_without_touching_hardware() {
        let regions = PortRegions::new();
        let ports = FakePorts::new();
        let accessor = RegisterAccessor::new(window(&regions), ports.clone());
        let reg = gpe0_en();
        accessor.write(reg, 0x1234_5678).unwrap();
        let accesses = ports.access_count();

        assert_eq!(accessor.set_bit(reg, 32, 1), Err(AccessError::BitOutOfRange(32)));
        assert_eq!(accessor.set_bit(reg, u32::MAX, 0), Err(AccessError::BitOutOfRange(u32::MAX)));
        assert_eq!(accessor.set_bit(reg, 3, 2), Err(AccessError::ValueOutOfRange(2)));
        assert_eq!(ports.access_count(), accesses);
        assert_eq!(accessor.read(reg), 0x1234_5678);
    }

    #[test]
    fn unaddressable_group_is_a_no_op() {
        let regions = PortRegions::new();
        let ports = FakePorts::new();
        let accessor = RegisterAccessor::new(window(&regions), ports.clone());
        let gpio = RegisterDescriptor::new("GP_LVL", RegisterGroup::GpioBase, 0x0c);

        assert_eq!(
            accessor.port_of(&gpio),
            Err(AccessError::InvalidGroup(RegisterGroup::GpioBase))
        );
        assert_eq!(accessor.read(&gpio), 0);
        assert!(accessor.write(&gpio, 1).is_err());
        assert!(accessor.set_bit(&gpio, 0, 1).is_err());
        assert_eq!(ports.access_count(), 0);
    }

    #[test]
    fn offsets_outside_the_window_are_refused() {
        let regions = PortRegions::new();
        let ports = FakePorts::new();
        let accessor = RegisterAccessor::new(window(&regions), ports.clone());
        let stray = RegisterDescriptor::new("STRAY", RegisterGroup::PmBase, 0x7e);

        assert!(accessor.port_of(&stray).is_err());
        assert_eq!(accessor.read(&stray), 0);
        assert_eq!(ports.access_count(), 0);
    }

    #[test]
    fn concurrent_set_bit_never_loses_a_bit() {
        let regions = PortRegions::new();
        let accessor = RegisterAccessor::new(window(&regions), FakePorts::with_race_window());
        let reg = gpe0_en();

        for _ in 0..20 {
            accessor.write(reg, 0).unwrap();
            thread::scope(|s| {
                for half in 0..2u32 {
                    let accessor = &accessor;
                    s.spawn(move || {
                        for bit in (half * 16)..(half * 16 + 16) {
                            accessor.set_bit(reg, bit, 1).unwrap();
                        }
                    });
                }
            });
            assert_eq!(accessor.read(reg), u32::MAX);
        }
    }

    #[test]
    fn into_parts_hands_back_the_reservation() {
        let regions = PortRegions::new();
        let accessor = RegisterAccessor::new(window(&regions), FakePorts::new());
        let (region, _bus) = accessor.into_parts();
        assert_eq!(region.start(), BASE);
        assert!(regions.is_reserved(BASE));
        region.release();
        assert!(!regions.is_reserved(BASE));
    }
}
