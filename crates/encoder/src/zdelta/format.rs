//! Packet framing for the zdelta bitstream.
//!
//! Layout, little-endian:
//!
//! ```text
//! | magic "ZDV1" (4) | tag (1) | pts u64 (8) | payload_len u32 (4) | payload |
//! ```
//!
//! One packet per frame, self-delimiting, with the magic repeated per packet
//! so a reader can resync after damage. `tag` is `K` for keyframes (payload
//! decompresses to a whole frame) or `D` for deltas (payload decompresses to
//! an XOR against the previous frame). Width, height, and rate travel out of
//! band -- the stream is elementary.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Stream magic, one per packet.
pub const PACKET_MAGIC: [u8; 4] = *b"ZDV1";
/// Keyframe tag.
pub const TAG_KEYFRAME: u8 = b'K';
/// Delta frame tag.
pub const TAG_DELTA: u8 = b'D';
/// Header bytes before the payload.
pub const HEADER_LEN: usize = 4 + 1 + 8 + 4;

/// Parsed packet header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub keyframe: bool,
    pub pts: u64,
    pub payload_len: u32,
}

/// Write one framed packet: header followed by payload.
pub fn write_packet<W: Write>(out: &mut W, header: &PacketHeader, payload: &[u8]) -> io::Result<()> {
    out.write_all(&PACKET_MAGIC)?;
    out.write_u8(if header.keyframe { TAG_KEYFRAME } else { TAG_DELTA })?;
    out.write_u64::<LittleEndian>(header.pts)?;
    out.write_u32::<LittleEndian>(header.payload_len)?;
    out.write_all(payload)?;
    Ok(())
}

/// Read and validate one packet header.
///
/// `Ok(None)` at clean end of stream (no bytes left); a partial header is an
/// `InvalidData` error, not an EOF.
pub fn read_header<R: Read>(reader: &mut R) -> io::Result<Option<PacketHeader>> {
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        let n = reader.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Ok(None);
    }
    if filled < magic.len() {
        return Err(invalid_data("truncated packet header"));
    }
    if magic != PACKET_MAGIC {
        return Err(invalid_data("bad packet magic"));
    }

    let keyframe = match reader.read_u8()? {
        TAG_KEYFRAME => true,
        TAG_DELTA => false,
        _ => return Err(invalid_data("unknown packet tag")),
    };
    let pts = reader.read_u64::<LittleEndian>()?;
    let payload_len = reader.read_u32::<LittleEndian>()?;

    Ok(Some(PacketHeader {
        keyframe,
        pts,
        payload_len,
    }))
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
