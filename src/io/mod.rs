mod file_reader;
mod range_reader;

pub use file_reader::FileRangeReader;
pub use range_reader::{
    read_f32_be, read_f32_le, read_u16_be, read_u16_le, read_u32_be, read_u32_le, BytesReader,
    RangeReader,
};
