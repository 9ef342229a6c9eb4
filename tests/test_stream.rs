//! Tests for the stream layer: in-memory, buffered, gzip, local file
//! and path-driven auto streams.

use std::io::Write;

use deepx_core::io::{
    read_line, AutoInputFileStream, AutoOutputFileStream, BufferedInputStream, FileStream,
    GunzipInputStream, InputStream, InputStringStream, OpenMode, OutputStream, OutputStringStream,
    StreamState,
};
use flate2::{write::GzEncoder, Compression};

// ============================================================================
// in-memory streams
// ============================================================================

#[test]
fn test_output_string_stream() {
    let mut os = OutputStringStream::new();
    assert!(os.is_ok());
    assert_eq!(os.write(b"abc"), 3);
    assert_eq!(os.write(b"de"), 2);
    assert_eq!(os.as_bytes(), b"abcde");
    assert_eq!(os.len(), 5);

    os.set_bad();
    assert_eq!(os.write(b"xyz"), 0);
    assert_eq!(os.as_bytes(), b"abcde");
}

#[test]
fn test_input_string_stream() {
    let data = b"hello world";
    let mut is = InputStringStream::new(data);
    let mut buf = [0u8; 5];
    assert_eq!(is.peek(&mut buf), 5);
    assert_eq!(&buf, b"hello");
    assert_eq!(is.read(&mut buf), 5);
    assert_eq!(is.read_byte(), Some(b' '));
    assert_eq!(is.remaining(), b"world");
    assert_eq!(is.skip(2), 2);

    // a short read transfers what is left and latches the bad bit
    let mut buf = [0u8; 8];
    assert_eq!(is.read(&mut buf), 3);
    assert!(is.bad());
    assert_eq!(is.read(&mut buf), 0);
}

#[test]
fn test_empty_input_is_bad() {
    let is = InputStringStream::new(b"");
    assert!(is.bad());
}

#[test]
fn test_read_line() {
    let data = b"alpha\nbeta\ngamma";
    let mut is = InputStringStream::new(data);
    let mut line = String::new();
    assert!(read_line(&mut is, &mut line));
    assert_eq!(line, "alpha");
    assert!(read_line(&mut is, &mut line));
    assert_eq!(line, "beta");
    // the last line has no delimiter but is still returned
    assert!(read_line(&mut is, &mut line));
    assert_eq!(line, "gamma");
    assert!(!read_line(&mut is, &mut line));
}

// ============================================================================
// buffered stream
// ============================================================================

#[test]
fn test_buffered_small_buffer() {
    let data: Vec<u8> = (0..=255).collect();
    let inner = InputStringStream::new(&data);
    // a 7-byte buffer forces many refills
    let mut is = BufferedInputStream::with_capacity(inner, 7);

    let mut head = [0u8; 3];
    assert_eq!(is.read(&mut head), 3);
    assert_eq!(head, [0, 1, 2]);

    // peek past the buffer capacity grows it transparently
    let mut peeked = [0u8; 50];
    assert_eq!(is.peek(&mut peeked), 50);
    assert_eq!(peeked[0], 3);
    assert_eq!(peeked[49], 52);

    // the peeked bytes are still readable
    let mut rest = vec![0u8; 253];
    assert_eq!(is.read(&mut rest), 253);
    assert_eq!(rest[0], 3);
    assert_eq!(rest[252], 255);

    assert_eq!(is.read(&mut head), 0);
    assert!(is.bad());
}

#[test]
fn test_buffered_read_byte() {
    let data = b"xy";
    let inner = InputStringStream::new(data);
    let mut is = BufferedInputStream::new(inner);
    assert_eq!(is.read_byte(), Some(b'x'));
    assert_eq!(is.read_byte(), Some(b'y'));
    assert_eq!(is.read_byte(), None);
    assert!(is.bad());
}

// ============================================================================
// gzip stream
// ============================================================================

fn gzip_bytes(payload: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_gunzip_roundtrip() {
    let payload: Vec<u8> = (0..10_000u32).flat_map(|v| v.to_le_bytes()).collect();
    let compressed = gzip_bytes(&payload);

    let inner = InputStringStream::new(&compressed);
    let mut is = GunzipInputStream::new(inner);

    let mut head = [0u8; 4];
    assert_eq!(is.peek(&mut head), 4);
    assert_eq!(head, [0, 0, 0, 0]);

    let mut decompressed = vec![0u8; payload.len()];
    assert_eq!(is.read(&mut decompressed), payload.len());
    assert_eq!(decompressed, payload);

    // the payload is exhausted
    let mut extra = [0u8; 1];
    assert_eq!(is.read(&mut extra), 0);
    assert!(is.bad());
}

#[test]
fn test_gunzip_garbage_sets_bad() {
    let garbage = vec![0xaau8; 64];
    let inner = InputStringStream::new(&garbage);
    let mut is = GunzipInputStream::new(inner);
    let mut buf = [0u8; 16];
    assert_eq!(is.read(&mut buf), 0);
    assert!(is.bad());
}

// ============================================================================
// local file stream
// ============================================================================

#[test]
fn test_file_stream_write_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let path = path.to_str().unwrap();

    let payload = b"binary \x00\x01\x02 payload";
    let mut os = FileStream::new();
    os.open(path, OpenMode::OUT).unwrap();
    assert_eq!(os.write(payload), payload.len());
    assert!(os.flush());
    os.close();

    let mut is = FileStream::new();
    is.open(path, OpenMode::IN).unwrap();
    let mut head = [0u8; 6];
    assert_eq!(is.peek(&mut head), 6);
    assert_eq!(&head, b"binary");
    let mut read_back = vec![0u8; payload.len()];
    assert_eq!(is.read(&mut read_back), payload.len());
    assert_eq!(read_back, payload);
}

#[test]
fn test_file_stream_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.bin");
    let mut is = FileStream::new();
    assert!(is.open(path.to_str().unwrap(), OpenMode::IN).is_err());
    assert!(is.bad());
}

#[test]
fn test_file_stream_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.bin");
    let path = path.to_str().unwrap();

    let mut os = FileStream::new();
    os.open(path, OpenMode::OUT).unwrap();
    os.write(b"one");
    os.close();

    let mut os = FileStream::new();
    os.open(path, OpenMode::APPEND).unwrap();
    os.write(b"two");
    os.close();

    assert_eq!(std::fs::read(path).unwrap(), b"onetwo");
}

#[test]
fn test_short_read_sets_bad() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, b"abc").unwrap();

    let mut is = FileStream::new();
    is.open(path.to_str().unwrap(), OpenMode::IN).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(is.read(&mut buf), 3);
    assert!(is.bad());
    // further operations are no-ops
    assert_eq!(is.read(&mut buf), 0);
}

// ============================================================================
// auto streams
// ============================================================================

#[test]
fn test_auto_stream_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let path = path.to_str().unwrap();

    let mut os = AutoOutputFileStream::open(path).unwrap();
    assert_eq!(os.write(b"payload"), 7);
    assert!(os.flush());
    os.close();

    let mut is = AutoInputFileStream::open(path).unwrap();
    let mut buf = [0u8; 7];
    assert_eq!(is.read(&mut buf), 7);
    assert_eq!(&buf, b"payload");
}

#[test]
fn test_auto_stream_gz_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin.gz");
    std::fs::write(&path, gzip_bytes(b"compressed payload")).unwrap();

    let mut is = AutoInputFileStream::open(path.to_str().unwrap()).unwrap();
    let mut buf = [0u8; 18];
    assert_eq!(is.read(&mut buf), 18);
    assert_eq!(&buf, b"compressed payload");
}

#[test]
fn test_auto_stream_missing_file() {
    assert!(AutoInputFileStream::open("/no/such/file").is_err());
}
