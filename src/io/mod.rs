/*
 * Input/Output System
 *
 * Low-level port I/O plus the device abstraction the control file is
 * exposed through.
 */

pub mod device;
pub mod pio;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use pio::HardwarePorts;
pub use pio::{Io, Pio, PortBus, ReadOnly};

pub use device::{Device, Errno, Stat, S_IFMT, S_IFREG};
