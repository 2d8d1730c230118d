use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{fs, path::Path};

pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(b64: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(b64.trim())?)
}

pub fn encode_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(encode_bytes(&bytes))
}

/// Decode `b64` and write it to `dest`, returning the number of bytes written.
pub fn decode_to_file(b64: &str, dest: &Path) -> Result<usize> {
    let bytes = decode(b64)?;
    fs::write(dest, &bytes)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_roundtrip_is_byte_identical() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("in.bin");
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        fs::write(&src, &data).unwrap();

        let b64 = encode_file(&src).unwrap();
        let dst = tmp.path().join("out.bin");
        assert_eq!(decode_to_file(&b64, &dst).unwrap(), data.len());
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("not base64!!").is_err());
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        assert_eq!(decode(" YWJj\n").unwrap(), b"abc");
    }
}
