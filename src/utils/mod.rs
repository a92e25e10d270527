/*
 * Utilities
 *
 * Support code that is not part of the driver proper.
 */

pub mod logger;

pub use logger::PmLogger;
