//! Graph stream framing constants.

pub const MAGIC: [u8; 2] = [0x47, 0x50];
pub const VERSION: u8 = 1;

pub const TAG_NULL: u8 = 0x70;
pub const TAG_REFERENCE: u8 = 0x71;
pub const TAG_DESCRIPTOR: u8 = 0x72;
pub const TAG_OBJECT: u8 = 0x73;
pub const TAG_STRING: u8 = 0x74;
pub const TAG_LIST: u8 = 0x75;
