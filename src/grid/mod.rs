mod buffer;
mod double_buffer;
mod raw;

pub use buffer::Grid3;
pub use double_buffer::DoubleBuffer;
pub(crate) use raw::{SharedCells, SharedCellsMut};
