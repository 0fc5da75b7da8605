//! Embedding the binary manifest as a private PNG chunk.
//!
//! Chunk layout: `length (u32 BE) || b"spRt" || blob || crc32(type || blob) (u32 BE)`,
//! inserted right before `IEND`.

use crate::codec::{decode_manifest, encode_manifest};
use crate::error::{Result, SpriteError};
use crate::model::Manifest;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
/// Ancillary, private, safe-to-copy chunk type.
pub const MANIFEST_CHUNK: [u8; 4] = *b"spRt";
const IEND: [u8; 4] = *b"IEND";

/// CRC-32 (IEEE) as used by PNG.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

static CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = 0xEDB8_8320 ^ (crc >> 1);
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// One chunk located inside a PNG byte stream.
#[derive(Debug, Clone, Copy)]
struct Chunk<'a> {
    /// Offset of the length field.
    start: usize,
    kind: [u8; 4],
    data: &'a [u8],
    crc: u32,
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn chunks(png: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if png.len() < PNG_SIGNATURE.len() || png[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(SpriteError::InvalidContainer);
    }
    let mut out = Vec::new();
    let mut pos = PNG_SIGNATURE.len();
    while pos < png.len() {
        let len = read_u32(png, pos).ok_or(SpriteError::InvalidContainer)? as usize;
        let kind_bytes = png
            .get(pos + 4..pos + 8)
            .ok_or(SpriteError::InvalidContainer)?;
        let kind = [kind_bytes[0], kind_bytes[1], kind_bytes[2], kind_bytes[3]];
        let data_end = (pos + 8)
            .checked_add(len)
            .ok_or(SpriteError::InvalidContainer)?;
        let data = png
            .get(pos + 8..data_end)
            .ok_or(SpriteError::InvalidContainer)?;
        let crc = read_u32(png, data_end).ok_or(SpriteError::InvalidContainer)?;
        out.push(Chunk {
            start: pos,
            kind,
            data,
            crc,
        });
        pos = data_end + 4;
        if kind == IEND {
            break;
        }
    }
    Ok(out)
}

fn chunk_bytes(kind: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(12 + data.len());
    chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
    chunk.extend_from_slice(&kind);
    chunk.extend_from_slice(data);
    let crc = crc32(&chunk[4..]);
    chunk.extend_from_slice(&crc.to_be_bytes());
    chunk
}

/// Inserts `blob` as a manifest chunk right before `IEND`.
///
/// Existing manifest chunks are replaced.
pub fn embed_blob(png: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let found = chunks(png)?;
    let iend = found
        .iter()
        .find(|c| c.kind == IEND)
        .ok_or(SpriteError::InvalidContainer)?;

    let mut out = Vec::with_capacity(png.len() + blob.len() + 12);
    out.extend_from_slice(&PNG_SIGNATURE);
    for chunk in found.iter().filter(|c| c.kind != MANIFEST_CHUNK && c.kind != IEND) {
        let end = chunk.start + 12 + chunk.data.len();
        out.extend_from_slice(&png[chunk.start..end]);
    }
    out.extend_from_slice(&chunk_bytes(MANIFEST_CHUNK, blob));
    out.extend_from_slice(&png[iend.start..]);
    Ok(out)
}

/// Returns the verified manifest chunk payload, or `None` when there is none.
pub fn extract_blob(png: &[u8]) -> Result<Option<Vec<u8>>> {
    let Some(chunk) = chunks(png)?.into_iter().find(|c| c.kind == MANIFEST_CHUNK) else {
        return Ok(None);
    };
    let mut checked = Vec::with_capacity(4 + chunk.data.len());
    checked.extend_from_slice(&chunk.kind);
    checked.extend_from_slice(chunk.data);
    let actual = crc32(&checked);
    if actual != chunk.crc {
        return Err(SpriteError::Integrity {
            expected: chunk.crc,
            actual,
        });
    }
    Ok(Some(chunk.data.to_vec()))
}

/// Encodes `manifest` and embeds it into `png`.
pub fn embed_manifest(png: &[u8], manifest: &Manifest) -> Result<Vec<u8>> {
    embed_blob(png, &encode_manifest(manifest))
}

/// Reads the embedded manifest back. Zones are not carried in the chunk.
pub fn extract_manifest(png: &[u8]) -> Result<Option<Manifest>> {
    extract_blob(png)?.map(|blob| decode_manifest(&blob)).transpose()
}
