/*
 * Hardware Drivers
 *
 * Driver categories:
 * - PM: the ICH7 power-management register block and its control file
 * - PCI: configuration space access to the LPC bridge
 * - Serial: UART used as the log sink
 */

pub mod pci;
pub mod pm;
pub mod serial;

pub use serial::SerialPort;
