//! Minimal PNG encoder for 8-bit RGB canvases.
//!
//! Writes the signature, one IHDR, one zlib-compressed IDAT (filter type 0 on
//! every scanline) and IEND.

use std::io::{self, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{write::ZlibEncoder, Compression, Crc};

use crate::captcha::canvas::Canvas;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGB: u8 = 2;

/// Encode the canvas as PNG bytes.
pub fn encode(canvas: &Canvas) -> io::Result<Vec<u8>> {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&canvas.width().to_be_bytes());
    ihdr.extend_from_slice(&canvas.height().to_be_bytes());
    // depth, color type, compression, filter, interlace
    ihdr.extend_from_slice(&[BIT_DEPTH, COLOR_TYPE_RGB, 0, 0, 0]);

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    for row in canvas.rows() {
        zlib.write_all(&[0])?;
        for pixel in row {
            zlib.write_all(pixel)?;
        }
    }
    let idat = zlib.finish()?;

    let mut out = Vec::with_capacity(SIGNATURE.len() + idat.len() + 64);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, b"IHDR", &ihdr);
    write_chunk(&mut out, b"IDAT", &idat);
    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

/// Encode the canvas as a `data:image/png;base64,` URI.
pub fn encode_data_uri(canvas: &Canvas) -> io::Result<String> {
    let bytes = encode(canvas)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn chunk_at(bytes: &[u8], offset: usize) -> (&[u8], &[u8], usize) {
        let len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        let kind = &bytes[offset + 4..offset + 8];
        let data = &bytes[offset + 8..offset + 8 + len];
        (kind, data, offset + 12 + len)
    }

    #[test]
    fn test_structure() {
        let mut canvas = Canvas::new(3, 2, [10, 20, 30]);
        canvas.put(2, 1, [255, 0, 0]);
        let bytes = encode(&canvas).unwrap();

        assert_eq!(&bytes[..8], &SIGNATURE);

        let (kind, ihdr, next) = chunk_at(&bytes, 8);
        assert_eq!(kind, b"IHDR");
        assert_eq!(&ihdr[..8], &[0, 0, 0, 3, 0, 0, 0, 2]);
        assert_eq!(&ihdr[8..], &[8, 2, 0, 0, 0]);

        let (kind, idat, next) = chunk_at(&bytes, next);
        assert_eq!(kind, b"IDAT");
        let mut raw = Vec::new();
        ZlibDecoder::new(idat).read_to_end(&mut raw).unwrap();
        assert_eq!(
            raw,
            vec![0, 10, 20, 30, 10, 20, 30, 10, 20, 30, 0, 10, 20, 30, 10, 20, 30, 255, 0, 0]
        );

        let (kind, data, end) = chunk_at(&bytes, next);
        assert_eq!(kind, b"IEND");
        assert!(data.is_empty());
        assert_eq!(end, bytes.len());
    }

    #[test]
    fn test_iend_crc_matches_reference() {
        let bytes = encode(&Canvas::new(1, 1, [0, 0, 0])).unwrap();
        // CRC-32 of "IEND" is fixed for every PNG.
        assert_eq!(&bytes[bytes.len() - 4..], &[0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = encode_data_uri(&Canvas::new(2, 2, [1, 2, 3])).unwrap();
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = STANDARD.decode(payload).unwrap();
        assert_eq!(&decoded[..8], &SIGNATURE);
    }
}
