/*
 * Port I/O (PIO) Implementation
 *
 * This module provides a safe Rust interface to x86 port I/O operations.
 * The ICH7 power-management block lives in I/O space, so every register
 * access in this crate ends up as an IN/OUT instruction issued here.
 *
 * Two shapes are offered:
 * - `Pio<T>`: one fixed port with a typed value (u8 or u32), used for
 *   devices whose layout is known up front (the debug UART).
 * - `PortBus`: any 32-bit port, chosen at call time. The register accessor
 *   computes ports from a base discovered at probe time, so it talks to a
 *   `PortBus` instead of holding one `Pio` per register.
 */

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use core::arch::asm;
use core::marker::PhantomData;

/// I/O interface trait
pub trait Io {
    /// The value type used for I/O operations.
    type Value: Copy
        + PartialEq
        + core::ops::BitAnd<Output = Self::Value>
        + core::ops::BitOr<Output = Self::Value>
        + core::ops::Not<Output = Self::Value>;

    /// Reads the value from the I/O interface.
    fn read(&self) -> Self::Value;

    /// Writes the value to the I/O interface.
    fn write(&mut self, value: Self::Value);

    /// Reads the value from the I/O interface and checks if the specified flags are set.
    fn readf(&self, flags: Self::Value) -> bool {
        (self.read() & flags) == flags
    }
}

/// Wrapper for an I/O interface providing read-only access.
pub struct ReadOnly<I> {
    inner: I,
}

impl<I> ReadOnly<I> {
    /// Creates a new `ReadOnly` wrapper instance.
    pub const fn new(inner: I) -> ReadOnly<I> {
        ReadOnly { inner }
    }
}

impl<I: Io> ReadOnly<I> {
    /// Reads the value from the I/O interface.
    #[inline(always)]
    pub fn read(&self) -> I::Value {
        self.inner.read()
    }

    /// Reads the value from the I/O interface and checks if the specified flags are set.
    pub fn readf(&self, flags: I::Value) -> bool {
        self.inner.readf(flags)
    }
}

/// Generic PIO
#[derive(Copy, Clone)]
pub struct Pio<T> {
    port: u16,
    value: PhantomData<T>,
}

impl<T> Pio<T> {
    /// Create a new PIO instance with the specified port.
    ///
    /// # Arguments
    ///
    /// * `port` - The port number.
    pub const fn new(port: u16) -> Self {
        Pio::<T> {
            port,
            value: PhantomData,
        }
    }
}

/// Read/Write for byte PIO
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Io for Pio<u8> {
    type Value = u8;

    #[inline(always)]
    fn read(&self) -> u8 {
        let value: u8;
        unsafe {
            asm!(
                "in al, dx",
                in("dx") self.port,
                out("al") value,
                options(nostack, nomem, preserves_flags)
            );
        }
        value
    }

    #[inline(always)]
    fn write(&mut self, value: u8) {
        unsafe {
            asm!(
                "out dx, al",
                in("dx") self.port,
                in("al") value,
                options(nostack, nomem, preserves_flags)
            );
        }
    }
}

/// Read/Write for doubleword PIO
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Io for Pio<u32> {
    type Value = u32;

    /// Read a doubleword from the port (`inl`).
    #[inline(always)]
    fn read(&self) -> u32 {
        let value: u32;
        unsafe {
            asm!(
                "in eax, dx",
                in("dx") self.port,
                out("eax") value,
                options(nostack, nomem, preserves_flags)
            );
        }
        value
    }

    /// Write a doubleword to the port (`outl`).
    #[inline(always)]
    fn write(&mut self, value: u32) {
        unsafe {
            asm!(
                "out dx, eax",
                in("dx") self.port,
                in("eax") value,
                options(nostack, nomem, preserves_flags)
            );
        }
    }
}

/// Doubleword access to an arbitrary port.
///
/// Implementors do no locking of their own; callers that need a
/// read-modify-write to be atomic must serialize around the bus.
pub trait PortBus: Send {
    /// Read 32 bits from `port`.
    fn read_u32(&mut self, port: u16) -> u32;

    /// Write 32 bits to `port`.
    fn write_u32(&mut self, port: u16, value: u32);
}

/// The real I/O space of the executing CPU.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwarePorts;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl PortBus for HardwarePorts {
    #[inline(always)]
    fn read_u32(&mut self, port: u16) -> u32 {
        Pio::<u32>::new(port).read()
    }

    #[inline(always)]
    fn write_u32(&mut self, port: u16, value: u32) {
        Pio::<u32>::new(port).write(value)
    }
}
