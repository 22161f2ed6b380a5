//! gzip framing for stored values. CSV bodies compress by roughly 10x.

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

pub fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

pub fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_then_decompress() {
        let body = "dateRep,cases,deaths\n".repeat(200);
        let packed = compress(body.as_bytes()).unwrap();
        assert!(packed.len() < body.len());
        assert_eq!(decompress(&packed).unwrap(), body.as_bytes());
    }

    #[test]
    fn garbage_fails_to_decompress() {
        assert!(decompress(b"not gzip").is_err());
    }
}
