//! Reader/Writer behaviour on well-formed and truncated input.

use graphpack_buffers::{BufferError, Reader, Writer};
use proptest::prelude::*;

#[test]
fn mixed_width_sequence_reads_back_in_order() {
    let mut w = Writer::new();
    w.u8(0x47);
    w.u16(3);
    w.utf8("Foo");
    w.u64(0x0123_4567_89ab_cdef);
    w.i64(-2);
    w.f64(1.5);
    let data = w.flush();

    let mut r = Reader::new(&data);
    assert_eq!(r.u8(), Ok(0x47));
    let len = r.u16().unwrap() as usize;
    assert_eq!(r.utf8(len), Ok("Foo"));
    assert_eq!(r.u64(), Ok(0x0123_4567_89ab_cdef));
    assert_eq!(r.i64(), Ok(-2));
    assert_eq!(r.f64(), Ok(1.5));
    assert!(r.is_empty());
}

#[test]
fn peek_does_not_advance() {
    let data = [0x70, 0x71];
    let mut r = Reader::new(&data);
    assert_eq!(r.peek(), Ok(0x70));
    assert_eq!(r.peek(), Ok(0x70));
    assert_eq!(r.u8(), Ok(0x70));
    assert_eq!(r.peek(), Ok(0x71));
}

#[test]
fn reading_from_empty_input_reports_offset() {
    let mut r = Reader::new(&[]);
    assert_eq!(
        r.peek(),
        Err(BufferError::EndOfBuffer {
            offset: 0,
            needed: 1,
            available: 0,
        })
    );
    assert!(r.f64().is_err());
}

#[test]
fn oversized_buf_request_fails_without_consuming() {
    let data = [1, 2, 3];
    let mut r = Reader::new(&data);
    assert!(r.buf(4).is_err());
    assert_eq!(r.size(), 3);
    assert_eq!(r.buf(3), Ok(&data[..]));
}

proptest! {
    #[test]
    fn truncated_input_never_panics(
        data in proptest::collection::vec(any::<u8>(), 0..32),
        n in 0usize..64,
    ) {
        let mut r = Reader::new(&data);
        let _ = r.u32();
        let _ = r.utf8(n);
        let _ = r.i64();
        prop_assert!(r.x <= data.len());
    }
}
