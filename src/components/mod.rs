/*
 * Control Channel Components
 *
 * The text side of the driver: splitting writes into arguments, running
 * them as register commands, and rendering register snapshots for reads.
 */

pub mod command;
pub mod control;
pub mod tokenizer;

pub use command::{CommandDispatcher, Dispatched, Outcome, Rejection};
pub use control::{ControlFile, ControlSession, Phase};
pub use tokenizer::tokenize;
