//! Self-describing graph stream format.
//!
//! ```text
//! stream     := 0x47 0x50 version:u8 value
//! value      := NULL | REFERENCE | STRING | OBJECT | LIST
//! OBJECT     := 0x73 (DESCRIPTOR | REFERENCE) field-value*
//! DESCRIPTOR := 0x72 name:str16 fingerprint:u64 count:u16 (kind:u8 name:str16)*
//! LIST       := 0x75 count:u32 value*
//! ```
//!
//! Handles are numbered from zero in stream order: a descriptor when it is
//! first written, an object right after its descriptor and before its fields,
//! a list before its elements. References to an object still being read are
//! what make cyclic graphs representable.

pub mod constants;
mod decoder;
mod encoder;

pub use decoder::GraphDecoder;
pub use encoder::GraphEncoder;
