/*
 * 16550 UART Debug Port
 *
 * Transmit-only driver for the serial port the logger writes to. Nothing
 * in the driver reads from the port; only the line status register is
 * polled to wait for the transmitter.
 */

use core::fmt;

use bitflags::bitflags;

use crate::io::{Io, ReadOnly};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::io::Pio;

/// Base port of COM2, the debug/log port.
pub const COM2_BASE: u16 = 0x2f8;

bitflags! {
    /// Line status flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct LineStsFlags: u8 {
        const INPUT_FULL = 1;
        // 1 to 4 unknown
        const OUTPUT_EMPTY = 1 << 5;
        // 6 and 7 unknown
    }
}

/// Serial port representation.
pub struct SerialPort<T: Io<Value = u8>> {
    data: T,       // Data register, write to send
    int_en: T,     // Interrupt enable
    fifo_ctrl: T,  // FIFO control
    line_ctrl: T,  // Line control
    modem_ctrl: T, // Modem control
    line_sts: ReadOnly<T>, // Line status
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl SerialPort<Pio<u8>> {
    /// Creates a serial port on the real I/O ports starting at `base`.
    pub const fn new(base: u16) -> SerialPort<Pio<u8>> {
        SerialPort {
            data: Pio::new(base),
            int_en: Pio::new(base + 1),
            fifo_ctrl: Pio::new(base + 2),
            line_ctrl: Pio::new(base + 3),
            modem_ctrl: Pio::new(base + 4),
            line_sts: ReadOnly::new(Pio::new(base + 5)),
        }
    }
}

impl<T: Io<Value = u8>> SerialPort<T> {
    /// Creates a serial port whose registers come from `port(base + n)`.
    pub fn with_io(base: u16, port: impl Fn(u16) -> T) -> Self {
        SerialPort {
            data: port(base),
            int_en: port(base + 1),
            fifo_ctrl: port(base + 2),
            line_ctrl: port(base + 3),
            modem_ctrl: port(base + 4),
            line_sts: ReadOnly::new(port(base + 5)),
        }
    }

    /// Initializes the serial port: 115200 8N1, FIFOs on, interrupts off.
    pub fn init(&mut self) {
        self.int_en.write(0x00);
        self.line_ctrl.write(0x80); // DLAB on
        self.data.write(0x01); // divisor low: 115200 baud
        self.int_en.write(0x00); // divisor high
        self.line_ctrl.write(0x03); // 8 bits, no parity, one stop bit
        self.fifo_ctrl.write(0xC7);
        self.modem_ctrl.write(0x0B);
    }

    /// Sends a byte once the transmitter has room.
    pub fn send(&mut self, data: u8) {
        while !self.line_sts.readf(LineStsFlags::OUTPUT_EMPTY.bits()) {
            core::hint::spin_loop();
        }
        self.data.write(data)
    }

    /// Writes a byte, translating `\n` to `\r\n`.
    pub fn write(&mut self, b: u8) {
        if b == b'\n' {
            self.send(b'\r');
        }
        self.send(b);
    }
}

impl<T: Io<Value = u8>> fmt::Write for SerialPort<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write(byte);
        }
        Ok(())
    }
}
