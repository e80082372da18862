//! GLB binary container.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic "glTF" | version u32 | total length u32
//! chunk length u32 | "JSON" | JSON text, space padded to 4 bytes
//! chunk length u32 | "BIN\0" | binary data, zero padded to 4 bytes (optional)
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{Error, Result};

/// Magic bytes at the start of every GLB file.
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Container version written and accepted.
pub const GLB_VERSION: u32 = 2;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 12;

/// Chunk header size in bytes.
pub const CHUNK_HEADER_SIZE: usize = 8;

pub const CHUNK_JSON: u32 = 0x4E4F_534A;
pub const CHUNK_BIN: u32 = 0x004E_4942;

/// Round `n` up to a multiple of 4.
#[inline]
pub const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Whether `bytes` start with the GLB magic.
pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == GLB_MAGIC
}

/// Pack JSON text and an optional binary chunk into a GLB container.
pub fn encode_glb(json: &[u8], bin: Option<&[u8]>) -> Result<Vec<u8>> {
    let json_len = align4(json.len());
    let bin_len = bin.map_or(0, |b| align4(b.len()));
    let mut total = HEADER_SIZE + CHUNK_HEADER_SIZE + json_len;
    if bin.is_some() {
        total += CHUNK_HEADER_SIZE + bin_len;
    }
    let total_u32 = u32::try_from(total)
        .map_err(|_| Error::WriteFailed(format!("GLB of {} bytes exceeds 4 GiB", total)))?;

    let mut out = Vec::with_capacity(total);
    out.write_all(GLB_MAGIC)?;
    out.write_u32::<LittleEndian>(GLB_VERSION)?;
    out.write_u32::<LittleEndian>(total_u32)?;

    out.write_u32::<LittleEndian>(json_len as u32)?;
    out.write_u32::<LittleEndian>(CHUNK_JSON)?;
    out.write_all(json)?;
    out.resize(out.len() + json_len - json.len(), b' ');

    if let Some(bin) = bin {
        out.write_u32::<LittleEndian>(bin_len as u32)?;
        out.write_u32::<LittleEndian>(CHUNK_BIN)?;
        out.write_all(bin)?;
        out.resize(out.len() + bin_len - bin.len(), 0);
    }
    Ok(out)
}

/// Split a GLB container into its JSON text and binary chunk.
///
/// Unknown chunk types after the JSON chunk are skipped.
pub fn decode_glb(bytes: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::UnexpectedEof(bytes.len() as u64));
    }
    if !is_glb(bytes) {
        return Err(Error::InvalidMagic);
    }
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(4);
    let version = cursor.read_u32::<LittleEndian>()?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedVersion(format!("GLB container version {}", version)));
    }
    let length = cursor.read_u32::<LittleEndian>()? as usize;
    if length > bytes.len() {
        return Err(Error::UnexpectedEof(bytes.len() as u64));
    }

    let mut json = None;
    let mut bin = None;
    while (cursor.position() as usize) + CHUNK_HEADER_SIZE <= length {
        let chunk_len = cursor.read_u32::<LittleEndian>()? as usize;
        let chunk_type = cursor.read_u32::<LittleEndian>()?;
        let start = cursor.position() as usize;
        if start + chunk_len > length {
            return Err(Error::UnexpectedEof((start + chunk_len) as u64));
        }
        let mut data = vec![0u8; chunk_len];
        cursor.read_exact(&mut data)?;
        match chunk_type {
            CHUNK_JSON if json.is_none() => json = Some(data),
            CHUNK_BIN if json.is_some() && bin.is_none() => bin = Some(data),
            CHUNK_JSON | CHUNK_BIN => {
                return Err(Error::invalid("GLB chunks out of order or repeated"));
            }
            _ => {}
        }
    }

    let json = json.ok_or_else(|| Error::invalid("GLB has no JSON chunk"))?;
    Ok((json, bin))
}
