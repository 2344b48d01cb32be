//! Minimal RIFF chunk plumbing. Chunks are `id:[u8;4] len:u32le payload`, where a `RIFF`
//! chunk's payload starts with a four byte form type.

use az::CheckedAs;
use std::io::{Error as IOError, ErrorKind as IOErrorKind, Read, Result as IOResult, Write};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct ChunkID(pub [u8; 4]);
impl ChunkID {
    // RIFF standard chunks
    pub const RIFF: Self = ChunkID(*b"RIFF");
    // ArtiVault drawing chunks
    pub const AVDW: Self = ChunkID(*b"avdw");
    pub const HEAD: Self = ChunkID(*b"head");
    pub const STRK: Self = ChunkID(*b"strk");
    pub const CSUM: Self = ChunkID(*b"csum");
    #[must_use]
    pub fn id_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}
impl std::fmt::Display for ChunkID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Write as a string if possible, otherwise as a hex string.
        if let Some(str) = self.id_str() {
            f.write_str(str)
        } else {
            write!(f, "{:x?}", self.0)
        }
    }
}
impl std::ops::Deref for ChunkID {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A chunk of unstructured binary with a size fixed up-front.
///
/// Writes past the declared size are truncated (reported as a zero-length write). Bytes not
/// written before [`Self::finish`] or drop are zero-filled so the stream stays well-formed.
pub struct SizedChunkWriter<W: Write> {
    id: ChunkID,
    len_remaining: u32,
    writer: W,
}
impl<W: Write> SizedChunkWriter<W> {
    const ZEROS: &'static [u8] = &[0; 64];
    pub fn new(mut writer: W, id: ChunkID, len: usize) -> IOResult<Self> {
        let len: u32 = len.checked_as().ok_or_else(|| too_large(id))?;
        let len_le = len.to_le_bytes();
        #[rustfmt::skip]
        let start_data = [
            id[0],     id[1],     id[2],     id[3],
            len_le[0], len_le[1], len_le[2], len_le[3],
        ];
        writer.write_all(&start_data)?;

        Ok(Self {
            id,
            len_remaining: len,
            writer,
        })
    }
    /// Make a new chunk with a form type header included. `subtype` is NOT included in `len`.
    pub fn new_subtype(mut writer: W, id: ChunkID, subtype: ChunkID, len: usize) -> IOResult<Self> {
        let len: u32 = len
            .checked_as::<u32>()
            // 4 more bytes for inner ID
            .and_then(|len| len.checked_add(4))
            .ok_or_else(|| too_large(id))?;

        let len_le = len.to_le_bytes();
        #[rustfmt::skip]
        let start_data = [
            id[0],      id[1],      id[2],      id[3],
            len_le[0],  len_le[1],  len_le[2],  len_le[3],
            subtype[0], subtype[1], subtype[2], subtype[3],
        ];
        writer.write_all(&start_data)?;

        Ok(Self {
            id,
            // Already wrote 4 bytes of subtype.
            len_remaining: len - 4,
            writer,
        })
    }
    /// Convenience fn to place a whole buffer as a chunk.
    pub fn write_buf(writer: W, id: ChunkID, data: &[u8]) -> IOResult<()> {
        let mut chunk = Self::new(writer, id, data.len())?;
        chunk.write_all(data)?;
        chunk.finish()
    }
    #[must_use]
    pub fn id(&self) -> ChunkID {
        self.id
    }
    /// Same as Drop, but is able to report errors.
    pub fn finish(mut self) -> IOResult<()> {
        self.pad()?;
        self.flush()
    }
    fn pad(&mut self) -> IOResult<()> {
        while self.len_remaining != 0 {
            let take = (self.len_remaining as usize).min(Self::ZEROS.len());
            // Set before the fallible call, so a failed pad isn't retried on drop.
            self.len_remaining -= take as u32;
            self.writer.write_all(&Self::ZEROS[..take])?;
        }
        Ok(())
    }
}
impl<W: Write> Write for SizedChunkWriter<W> {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        let clamped_len = (self.len_remaining as usize).min(buf.len());
        // Explicit hint that the chunk is full.
        if clamped_len == 0 {
            return Ok(0);
        }
        let written = self.writer.write(&buf[..clamped_len])?;
        self.len_remaining = written
            .checked_as()
            .and_then(|written| self.len_remaining.checked_sub(written))
            .ok_or_else(|| IOError::other("inner writer overflowed chunk"))?;

        Ok(written)
    }
    fn flush(&mut self) -> IOResult<()> {
        self.writer.flush()
    }
}
impl<W: Write> Drop for SizedChunkWriter<W> {
    fn drop(&mut self) {
        if self.len_remaining != 0 {
            log::warn!("padding chunk {} in SizedChunkWriter dtor!", self.id);
            if let Err(e) = self.pad() {
                log::error!("error while padding in dtor: {e:?}");
            }
        }
    }
}

fn too_large(id: ChunkID) -> IOError {
    IOError::other(anyhow::anyhow!("RIFF chunk {id} exceeded 4GiB"))
}

/// Reads one chunk's header, then exposes its payload as a `Read` that ends at the chunk boundary.
pub struct ChunkReader<R: Read> {
    id: ChunkID,
    /// How far into the payload we've read. Reads EOF at cursor == len.
    cursor: u32,
    len: u32,
    reader: R,
}
impl<R: Read> ChunkReader<R> {
    /// Immediately fetches 8 bytes from the stream to get the ID and length.
    pub fn new(mut read: R) -> IOResult<Self> {
        let mut header = [0; 8];
        read.read_exact(&mut header).map_err(|e| {
            if e.kind() == IOErrorKind::UnexpectedEof {
                IOError::new(
                    IOErrorKind::UnexpectedEof,
                    anyhow::anyhow!("not enough bytes to read chunk header"),
                )
            } else {
                e
            }
        })?;
        let [a, b, c, d, l0, l1, l2, l3] = header;
        Ok(Self {
            id: ChunkID([a, b, c, d]),
            cursor: 0,
            len: u32::from_le_bytes([l0, l1, l2, l3]),
            reader: read,
        })
    }
    #[must_use]
    pub fn id(&self) -> ChunkID {
        self.id
    }
    /// Size of the chunk payload, as declared in its header.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.len as usize
    }
    /// Payload bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        (self.len - self.cursor) as usize
    }
    /// Read the four byte form type that starts a `RIFF` or `LIST` payload.
    pub fn subtype(&mut self) -> IOResult<ChunkID> {
        let mut inner_id = ChunkID([0; 4]);
        self.read_exact(&mut inner_id.0)?;
        Ok(inner_id)
    }
    /// Read an array from the payload.
    pub fn read_array<const N: usize>(&mut self) -> IOResult<[u8; N]> {
        let mut bytes = [0; N];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }
    /// Advance the inner reader to the end of this chunk.
    pub fn skip(mut self) -> IOResult<()> {
        let remaining = self.remaining() as u64;
        let skipped = std::io::copy(&mut (&mut self).take(remaining), &mut std::io::sink())?;
        if skipped == remaining {
            Ok(())
        } else {
            Err(IOErrorKind::UnexpectedEof.into())
        }
    }
}
impl<R: Read> Read for ChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IOResult<usize> {
        let max_bytes = self.len - self.cursor;
        let clamped_buf_len = buf.len().min(max_bytes as usize);
        let num_read = self.reader.read(&mut buf[..clamped_buf_len])?;

        // Add to cursor, ensure that inner reader didn't do a silly.
        self.cursor += num_read
            .checked_as::<u32>()
            .filter(|read| *read <= max_bytes)
            .ok_or_else(|| IOError::other("internal reader violated len requirements!"))?;

        Ok(num_read)
    }
}

#[cfg(test)]
mod test {
    use super::{ChunkID, ChunkReader, SizedChunkWriter};
    use std::io::{Read, Write};

    #[test]
    fn write_then_read_chunk() {
        let mut buf = Vec::new();
        SizedChunkWriter::write_buf(&mut buf, ChunkID::HEAD, b"abcd").unwrap();
        assert_eq!(&buf, b"head\x04\x00\x00\x00abcd");

        let mut reader = ChunkReader::new(buf.as_slice()).unwrap();
        assert_eq!(reader.id(), ChunkID::HEAD);
        assert_eq!(reader.data_len(), 4);
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"abcd");
    }
    #[test]
    fn short_write_is_zero_padded() {
        let mut buf = Vec::new();
        {
            let mut chunk = SizedChunkWriter::new(&mut buf, ChunkID::STRK, 6).unwrap();
            chunk.write_all(b"xy").unwrap();
            chunk.finish().unwrap();
        }
        assert_eq!(&buf, b"strk\x06\x00\x00\x00xy\x00\x00\x00\x00");
    }
    #[test]
    fn overlong_write_is_clamped() {
        let mut buf = Vec::new();
        let mut chunk = SizedChunkWriter::new(&mut buf, ChunkID::STRK, 2).unwrap();
        assert_eq!(chunk.write(b"xyz").unwrap(), 2);
        assert_eq!(chunk.write(b"z").unwrap(), 0);
        chunk.finish().unwrap();
        assert_eq!(buf.len(), 10);
    }
    #[test]
    fn subtype_and_skip() {
        let mut buf = Vec::new();
        {
            let mut riff =
                SizedChunkWriter::new_subtype(&mut buf, ChunkID::RIFF, ChunkID::AVDW, 4).unwrap();
            riff.write_all(b"1234").unwrap();
            riff.finish().unwrap();
        }
        buf.extend_from_slice(b"tail");
        let mut cursor = std::io::Cursor::new(buf.as_slice());
        let mut riff = ChunkReader::new(&mut cursor).unwrap();
        assert_eq!(riff.data_len(), 8);
        assert_eq!(riff.subtype().unwrap(), ChunkID::AVDW);
        riff.skip().unwrap();
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"tail");
    }
    #[test]
    fn truncated_header() {
        let err = ChunkReader::new(&b"RIF"[..]).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
