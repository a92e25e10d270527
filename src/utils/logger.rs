/*
 * Driver Logging
 *
 * A `log` backend that prints records as `[LEVEL] message` lines to any
 * `core::fmt::Write` sink. On x86 the stock instance writes to COM2 so
 * driver messages can be watched from outside the machine.
 *
 * The driver itself only uses the `log` macros; a kernel that already has
 * a logger installed keeps its own and never touches this module.
 */

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::drivers::serial::{COM2_BASE, SerialPort};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::io::Pio;

/// Logger writing to a serialized text sink.
pub struct PmLogger<W: Write + Send> {
    sink: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> PmLogger<W> {
    pub const fn new(sink: W, level: LevelFilter) -> Self {
        Self {
            sink: Mutex::new(sink),
            level,
        }
    }

    /// Run `f` with exclusive access to the sink.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.sink.lock())
    }
}

impl<W: Write + Send> Log for PmLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // A failing sink has nowhere to report to.
            let _ = writeln!(self.sink.lock(), "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Logger on the COM2 debug port.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub static COM2_LOGGER: PmLogger<SerialPort<Pio<u8>>> =
    PmLogger::new(SerialPort::<Pio<u8>>::new(COM2_BASE), LevelFilter::Info);

/// Install `logger` as the global logger.
///
/// Fails if another logger is already installed.
pub fn init(logger: &'static dyn Log, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

/// Program COM2 and route driver logs to it.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn init_com2() -> Result<(), SetLoggerError> {
    COM2_LOGGER.with_sink(|port| port.init());
    init(&COM2_LOGGER, LevelFilter::Info)
}
