//! Append-only bitstream file sink.
//!
//! Packets leave the session in emission order and land in the file in the
//! same order; the file's bytes are exactly the concatenation of the packet
//! payloads. Nothing is seeked or patched after the fact -- `finalize` only
//! flushes and closes the door.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kine_common::engine::EncodedPacket;
use kine_common::error::{EncodeError, EncodeResult};

use tracing::info;

/// Buffered file sink for encoded packets.
pub struct BitstreamSink {
    writer: BufWriter<File>,
    path: PathBuf,
    packets_written: u64,
    bytes_written: u64,
    finalized: bool,
}

impl BitstreamSink {
    /// Create the output file, truncating anything already there.
    pub fn create(path: &Path) -> EncodeResult<Self> {
        let file = File::create(path).map_err(|e| {
            EncodeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create output file {:?}: {}", path, e),
            ))
        })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            packets_written: 0,
            bytes_written: 0,
            finalized: false,
        })
    }

    /// Append one packet's bytes.
    pub fn write_packet(&mut self, packet: &EncodedPacket) -> EncodeResult<()> {
        if self.finalized {
            return Err(EncodeError::InvalidState {
                operation: "write packet",
                state: "finalized",
            });
        }
        self.writer.write_all(&packet.data)?;
        self.packets_written += 1;
        self.bytes_written += packet.data.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes to disk and stop accepting packets. Idempotent.
    pub fn finalize(&mut self) -> EncodeResult<()> {
        if self.finalized {
            return Ok(());
        }
        self.writer.flush()?;
        self.finalized = true;

        info!(
            path = %self.path.display(),
            packets = self.packets_written,
            bytes = self.bytes_written,
            "Bitstream finalized"
        );
        Ok(())
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: temporary file path for testing.
    fn temp_stream_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("kine_sink_test_{}.zdv", name));
        path
    }

    /// Helper: packet with the given payload bytes.
    fn fake_packet(pts: u64, data: &[u8]) -> EncodedPacket {
        EncodedPacket {
            data: data.to_vec(),
            pts,
            is_keyframe: pts == 0,
        }
    }

    #[test]
    fn test_create_sink() {
        let path = temp_stream_path("create");
        let mut sink = BitstreamSink::create(&path).unwrap();
        sink.finalize().unwrap();
        assert!(path.exists());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_is_packet_concatenation() {
        let path = temp_stream_path("concat");
        let mut sink = BitstreamSink::create(&path).unwrap();

        sink.write_packet(&fake_packet(0, b"alpha")).unwrap();
        sink.write_packet(&fake_packet(1, b"bb")).unwrap();
        sink.write_packet(&fake_packet(2, b"c")).unwrap();
        sink.finalize().unwrap();

        let contents = fs::read(&path).unwrap();
        assert_eq!(contents, b"alphabbc");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_counters() {
        let path = temp_stream_path("counters");
        let mut sink = BitstreamSink::create(&path).unwrap();
        assert_eq!(sink.packets_written(), 0);
        assert_eq!(sink.bytes_written(), 0);

        sink.write_packet(&fake_packet(0, &[0xAA; 16])).unwrap();
        sink.write_packet(&fake_packet(1, &[0xBB; 4])).unwrap();
        assert_eq!(sink.packets_written(), 2);
        assert_eq!(sink.bytes_written(), 20);

        sink.finalize().unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_after_finalize_rejected() {
        let path = temp_stream_path("after_finalize");
        let mut sink = BitstreamSink::create(&path).unwrap();
        sink.finalize().unwrap();

        let err = sink.write_packet(&fake_packet(0, b"late")).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidState { .. }));

        // File untouched by the rejected write.
        assert_eq!(fs::read(&path).unwrap().len(), 0);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_finalize_idempotent() {
        let path = temp_stream_path("idempotent");
        let mut sink = BitstreamSink::create(&path).unwrap();
        sink.write_packet(&fake_packet(0, b"data")).unwrap();
        sink.finalize().unwrap();
        sink.finalize().unwrap();
        assert!(sink.is_finalized());
        assert_eq!(fs::read(&path).unwrap(), b"data");
        fs::remove_file(&path).ok();
    }
}
