//! Compressed-input handling: a minimal single-entry ZIP reader and a
//! bzip2 whole-file extractor.
//!
//! SRTM tiles are commonly distributed as a `.hgt` wrapped in a one-entry
//! ZIP archive. Only the local file header is parsed — no central directory,
//! no multi-entry support. The entry is either stored verbatim or raw
//! DEFLATE (no gzip/zlib wrapper).
//!
//! USGS DEM files come bzip2-compressed; those are streamed to a temporary
//! file the caller owns and must delete.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::DeflateDecoder;
use tempfile::NamedTempFile;

use crate::error::{DemError, Result};

/// `PK\x03\x04`, the ZIP local file header signature.
const LOCAL_HEADER_SIG: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Fixed portion of the local file header, before name and extra fields.
const LOCAL_HEADER_LEN: usize = 30;

/// Compression method 0: entry stored without compression.
const METHOD_STORED: u16 = 0;

/// Read chunk size for the bzip2 stream.
const BZ_CHUNK: usize = 8 * 1024;

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Extract the first (and only) entry of a ZIP archive held in memory.
///
/// Validates the local file header signature, locates the payload past the
/// name and extra fields, and either copies a stored entry verbatim or
/// inflates a raw DEFLATE stream into a buffer sized from the declared
/// uncompressed size.
///
/// # Errors
///
/// - [`DemError::BadZipSignature`] if the buffer does not start with
///   `PK\x03\x04`
/// - [`DemError::TruncatedArchive`] if the buffer ends before the declared
///   payload does
/// - [`DemError::Inflate`] if the DEFLATE stream fails or yields a size
///   other than the header declared
pub fn unzip_single_entry(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < LOCAL_HEADER_LEN {
        return Err(DemError::TruncatedArchive {
            needed: LOCAL_HEADER_LEN,
            have: data.len(),
        });
    }
    if data[..4] != LOCAL_HEADER_SIG {
        return Err(DemError::BadZipSignature);
    }

    let method = read_u16(data, 8);
    let compressed_size = read_u32(data, 18) as usize;
    let uncompressed_size = read_u32(data, 22) as usize;
    let name_len = read_u16(data, 26) as usize;
    let extra_len = read_u16(data, 28) as usize;

    let payload_start = LOCAL_HEADER_LEN + name_len + extra_len;
    let payload_end = payload_start + compressed_size;
    if data.len() < payload_end {
        return Err(DemError::TruncatedArchive {
            needed: payload_end,
            have: data.len(),
        });
    }
    let payload = &data[payload_start..payload_end];

    if method == METHOD_STORED && compressed_size == uncompressed_size {
        return Ok(payload.to_vec());
    }

    let mut out = Vec::with_capacity(uncompressed_size);
    let mut decoder = DeflateDecoder::new(payload);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| DemError::Inflate {
            reason: e.to_string(),
        })?;
    if out.len() != uncompressed_size {
        return Err(DemError::Inflate {
            reason: format!(
                "produced {} bytes, header declared {}",
                out.len(),
                uncompressed_size
            ),
        });
    }
    Ok(out)
}

/// Decompress a bzip2 file into a newly created temporary file.
///
/// Streams in fixed-size chunks; nothing is held in memory beyond one
/// chunk. The returned path is owned by the caller, who must delete it.
///
/// # Errors
///
/// - [`DemError::Io`] if the source cannot be opened or the temp file
///   cannot be created or written
/// - [`DemError::Bzip2`] if the stream does not decode to a valid end state
pub fn decompress_bzip2_to_temp<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let source = File::open(path)?;
    let mut decoder = BzDecoder::new(source);
    let mut out = NamedTempFile::new()?;

    let mut chunk = [0u8; BZ_CHUNK];
    loop {
        let n = decoder.read(&mut chunk).map_err(|e| DemError::Bzip2 {
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        out.write_all(&chunk[..n])?;
    }

    let (_file, path) = out.keep().map_err(|e| DemError::Io(e.error))?;
    Ok(path)
}
