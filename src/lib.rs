/*
 * ICH7 Power-Management Register Driver
 *
 * Register control layer for the power-management I/O block of Intel ICH7
 * south bridges, with a small text control protocol on top.
 *
 * Reads of the control file return a snapshot of the exposed registers:
 *
 *   GPE0_STS        0x00000000
 *   GPE0_EN         0x00000010
 *
 * Writes are commands:
 *
 *   set <register> <value>
 *   setbit <register> <bit> <0|1>
 *
 * Layout:
 * - io: port I/O primitives and the file-like `Device` seam
 * - drivers: the PM driver (register catalog, accessor, port window),
 *   PCI config access to the LPC bridge, the serial log port
 * - components: tokenizer, command dispatcher, per-handle read session
 * - utils: the `log` backend
 *
 * The host kernel finds the LPC bridge, hands `PmDriver::probe` its config
 * space, and exposes the handles returned by `PmDriver::open` as a file.
 */

#![cfg_attr(not(test), no_std)]

pub mod components;
pub mod drivers;
pub mod io;
pub mod utils;

#[cfg(test)]
mod testing;

pub use components::{CommandDispatcher, ControlFile, ControlSession, Phase};
pub use drivers::pm::{
    AccessError, IO_REGIONS, IoRegion, PM_REGISTERS, PmConfig, PmDriver, PortRegions, ProbeError,
    RegionError, RegisterAccessor, RegisterDescriptor, RegisterGroup, RegisterTable,
};
pub use io::{Device, Errno, PortBus};
