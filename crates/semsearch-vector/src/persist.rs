//! On-disk index format.
//!
//! Little-endian layout:
//! - Header (20 bytes): magic `SSVX`, format version (u32), dimension (u32),
//!   vector count (u64)
//! - Payload: `count * dimension` f32 values, row-major
//! - Trailer (32 bytes): BLAKE3 digest of header + payload
//!
//! Files are written to a sibling temp file and renamed into place, so a
//! reader never observes a partially written index.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use semsearch_core::error::IndexError;
use tempfile::NamedTempFile;
use tracing::info;

use crate::index::VectorIndex;

const MAGIC: &[u8; 4] = b"SSVX";
const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;
const DIGEST_SIZE: usize = 32;
const BYTES_PER_F32: usize = 4;

fn io_err(path: &Path, source: io::Error) -> IndexError {
    IndexError::Io { path: path.to_path_buf(), source }
}

impl VectorIndex {
    /// Serializes the full index, digest included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, io::Error> {
        let dim = u32::try_from(self.dim())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "dimension does not fit in u32"))?;
        let payload = self.as_flat();
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len() * BYTES_PER_F32 + DIGEST_SIZE);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&dim.to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in payload {
            out.extend_from_slice(&value.to_le_bytes());
        }
        let digest = blake3::hash(&out);
        out.extend_from_slice(digest.as_bytes());
        Ok(out)
    }

    /// Parses bytes produced by [`VectorIndex::to_bytes`]. The error string
    /// says what is wrong with the buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_SIZE {
            return Err(format!("truncated header: {} of {HEADER_SIZE} bytes", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("not a vector index file (bad magic)".to_string());
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {version} (expected {FORMAT_VERSION})"));
        }
        let dim = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let count = u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]);
        let count = usize::try_from(count).map_err(|_| format!("vector count {count} does not fit in memory"))?;
        if dim == 0 && count > 0 {
            return Err(format!("header claims {count} vectors of dimension 0"));
        }

        let payload_len = count
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(BYTES_PER_F32))
            .ok_or_else(|| format!("header claims {count} vectors of dimension {dim}, which overflows"))?;
        let expected = payload_len
            .checked_add(HEADER_SIZE + DIGEST_SIZE)
            .ok_or_else(|| "declared size overflows".to_string())?;
        if bytes.len() < expected {
            return Err(format!(
                "truncated: {count} vectors of dimension {dim} need {expected} bytes, file has {}",
                bytes.len()
            ));
        }
        if bytes.len() > expected {
            return Err(format!("{} unexpected trailing bytes", bytes.len() - expected));
        }

        let body_end = HEADER_SIZE + payload_len;
        if blake3::hash(&bytes[..body_end]).as_bytes()[..] != bytes[body_end..] {
            return Err("checksum mismatch".to_string());
        }

        let data: Vec<f32> = bytes[HEADER_SIZE..body_end]
            .chunks_exact(BYTES_PER_F32)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self::from_parts(dim, count, data))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        let path = path.as_ref();
        let bytes = self.to_bytes().map_err(|e| io_err(path, e))?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| io_err(path, e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err(path, e))?;
        tmp.write_all(&bytes).map_err(|e| io_err(path, e))?;
        tmp.as_file().sync_all().map_err(|e| io_err(path, e))?;
        tmp.persist(path).map_err(|e| io_err(path, e.error))?;

        info!(path = %path.display(), vectors = self.len(), dim = self.dim(), bytes = bytes.len(), "saved vector index");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(IndexError::NotFound(path.to_path_buf())),
            Err(e) => return Err(io_err(path, e)),
        };
        let index = Self::from_bytes(&bytes)
            .map_err(|reason| IndexError::Corrupt { path: path.to_path_buf(), reason })?;
        info!(path = %path.display(), vectors = index.len(), dim = index.dim(), "loaded vector index");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VectorIndex {
        VectorIndex::build(vec![vec![0.0f32, 0.0], vec![10.0, 10.0], vec![-1.5, 2.25]]).unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"SSVX");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 2);
        assert_eq!(u64::from_le_bytes(bytes[12..20].try_into().unwrap()), 3);
        assert_eq!(bytes.len(), HEADER_SIZE + 3 * 2 * 4 + DIGEST_SIZE);
    }

    #[test]
    fn decode_round_trips_exact_bits() {
        let index = sample();
        let back = VectorIndex::from_bytes(&index.to_bytes().unwrap()).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn flipped_payload_bit_fails_checksum() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[HEADER_SIZE + 1] ^= 0x01;
        let err = VectorIndex::from_bytes(&bytes).unwrap_err();
        assert!(err.contains("checksum"), "{err}");
    }

    #[test]
    fn inflated_count_is_reported_as_truncated() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[12..20].copy_from_slice(&4u64.to_le_bytes());
        let err = VectorIndex::from_bytes(&bytes).unwrap_err();
        assert!(err.contains("truncated"), "{err}");
    }

    #[test]
    fn overflowing_header_is_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[12..20].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(VectorIndex::from_bytes(&bytes).is_err());
    }

    #[test]
    fn zero_dimension_with_rows_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        let digest = blake3::hash(&bytes);
        bytes.extend_from_slice(digest.as_bytes());

        let err = VectorIndex::from_bytes(&bytes).unwrap_err();
        assert!(err.contains("dimension 0"), "{err}");
    }

    #[test]
    fn bad_magic_and_version() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(VectorIndex::from_bytes(&bytes).unwrap_err().contains("magic"));

        let mut bytes = sample().to_bytes().unwrap();
        bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(VectorIndex::from_bytes(&bytes).unwrap_err().contains("version 9"));
    }
}
