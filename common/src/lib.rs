pub mod bit_cursor;
pub mod nal_unit;
pub mod rbsp;

pub use bit_cursor::{BitCursor, BitCursorError};
pub use nal_unit::*;
pub use rbsp::{EmulationPrevention, NalUnitKind};
