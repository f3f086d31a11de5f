//! Binary persistence for built dictionaries.
//!
//! The stream is little-endian and self-describing: a magic/version header,
//! the key and node counts, the three bit sequences, the label array, the
//! tail directory, and a trailing BLAKE3 digest of everything before it.
//! Loading validates the header, every declared section length against the
//! node count, the structural invariants (a well-formed level-order tree
//! shape, terminal popcount equal to the key count, tail spans inside the
//! pool, clean bit padding), and finally the digest: a truncated or
//! partially written stream is always rejected, never silently accepted.
//!
//! Writes are not atomic; crash safety is detection-only by design.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::bits::RankedBits;
use crate::keyset::MAX_KEY_LEN;
use crate::trie::{louds_is_well_formed, Trie};

/// Stream magic.
const MAGIC: [u8; 4] = *b"KTRI";
/// Current format version.
const VERSION: u16 = 1;
/// Size of the trailing BLAKE3 digest.
const DIGEST_LEN: usize = 32;
/// Upper bound on any single upfront reservation while parsing. Declared
/// lengths are untrusted until their bytes actually arrive, so longer
/// sections grow incrementally instead of reserving gigabytes on a header.
const MAX_PREALLOC: usize = 1 << 20;

/// Errors raised by [`save`] and [`load`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying storage failed.
    #[error("storage error: {0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the dictionary magic.
    #[error("not a dictionary stream (bad magic)")]
    BadMagic,

    /// The stream was written by an unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    /// The stream ended before the declared payload did.
    #[error("truncated dictionary stream")]
    Truncated,

    /// A declared length or structural invariant does not hold.
    #[error("corrupt dictionary stream: {0}")]
    Corrupt(&'static str),

    /// Payload bytes do not match the trailing digest.
    #[error("dictionary stream failed its integrity check")]
    ChecksumMismatch,
}

/// Serialize `trie` into `sink`.
pub fn save<W: Write>(trie: &Trie, sink: W) -> Result<(), CodecError> {
    let mut writer = HashingWriter::new(sink);

    writer.write_all(&MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?; // flags, reserved
    writer.write_all(&trie.num_keys().to_le_bytes())?;
    writer.write_all(&(trie.num_nodes() as u32).to_le_bytes())?;

    write_bits(&mut writer, &trie.louds)?;
    write_bits(&mut writer, &trie.terminal)?;
    write_bits(&mut writer, &trie.link)?;

    writer.write_all(&(trie.labels.len() as u32).to_le_bytes())?;
    writer.write_all(&trie.labels)?;

    writer.write_all(&(trie.tails.num_tails() as u32).to_le_bytes())?;
    for &start in &trie.tails.starts {
        writer.write_all(&start.to_le_bytes())?;
    }
    for &len in &trie.tails.lens {
        writer.write_all(&len.to_le_bytes())?;
    }
    writer.write_all(&(trie.tails.bytes.len() as u64).to_le_bytes())?;
    writer.write_all(&trie.tails.bytes)?;

    let (mut sink, digest) = writer.finish();
    sink.write_all(digest.as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Parse a dictionary from `source`.
///
/// The returned trie answers every query exactly as the saved one did.
pub fn load<R: Read>(source: R) -> Result<Trie, CodecError> {
    let mut reader = HashingReader::new(source);

    let mut magic = [0u8; 4];
    read_exact(&mut reader, &mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = read_u16(&mut reader)?;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let _flags = read_u16(&mut reader)?;

    let num_keys = read_u32(&mut reader)?;
    let num_nodes = read_u32(&mut reader)? as usize;
    if num_keys == 0 || num_nodes == 0 || num_keys as usize > num_nodes {
        return Err(CodecError::Corrupt("implausible key or node count"));
    }

    let louds = read_bits(&mut reader, 2 * num_nodes - 1)?;
    if louds.count_ones() != num_nodes - 1 {
        return Err(CodecError::Corrupt("degree bits disagree with node count"));
    }
    // Popcounts alone do not rule out a run closing before its node exists;
    // such a shape would send parent walks out of bounds or into a cycle.
    if !louds_is_well_formed(&louds) {
        return Err(CodecError::Corrupt("degree bits do not describe a tree"));
    }
    let terminal = read_bits(&mut reader, num_nodes)?;
    if terminal.count_ones() != num_keys as usize {
        return Err(CodecError::Corrupt(
            "terminal markers disagree with key count",
        ));
    }
    let link = read_bits(&mut reader, num_nodes)?;

    let label_len = read_u32(&mut reader)? as usize;
    if label_len != num_nodes - 1 {
        return Err(CodecError::Corrupt("label count disagrees with node count"));
    }
    let labels = read_byte_vec(&mut reader, label_len)?;

    let num_tails = read_u32(&mut reader)? as usize;
    if num_tails != link.count_ones() {
        return Err(CodecError::Corrupt("tail count disagrees with link bits"));
    }
    let mut starts = Vec::with_capacity(num_tails.min(MAX_PREALLOC / 4));
    for _ in 0..num_tails {
        starts.push(read_u32(&mut reader)?);
    }
    let mut lens = Vec::with_capacity(num_tails.min(MAX_PREALLOC / 4));
    for _ in 0..num_tails {
        lens.push(read_u32(&mut reader)?);
    }
    let pool_len = read_u64(&mut reader)?;
    if pool_len > num_tails as u64 * MAX_KEY_LEN as u64 {
        return Err(CodecError::Corrupt("tail pool larger than tails allow"));
    }
    let bytes = read_byte_vec(&mut reader, pool_len as usize)?;

    let tails = crate::trie::TailStore {
        starts,
        lens,
        bytes,
    };
    if !tails.spans_are_valid() {
        return Err(CodecError::Corrupt("tail span outside the pool"));
    }

    let (mut source, digest) = reader.finish();
    let mut stored = [0u8; DIGEST_LEN];
    source
        .read_exact(&mut stored)
        .map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::Truncated,
            _ => CodecError::Io(err),
        })?;
    if stored != *digest.as_bytes() {
        return Err(CodecError::ChecksumMismatch);
    }

    Ok(Trie {
        louds,
        terminal,
        link,
        labels,
        tails,
        num_keys,
    })
}

/// Save to a file path, buffered.
pub fn save_to_path<P: AsRef<Path>>(trie: &Trie, path: P) -> Result<(), CodecError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    save(trie, BufWriter::new(file))?;
    info!(
        num_keys = trie.num_keys(),
        num_nodes = trie.num_nodes(),
        path = %path.display(),
        "dictionary saved"
    );
    Ok(())
}

/// Load from a file path, buffered.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Trie, CodecError> {
    let path = path.as_ref();
    let trie = load(BufReader::new(File::open(path)?))?;
    info!(
        num_keys = trie.num_keys(),
        num_nodes = trie.num_nodes(),
        path = %path.display(),
        "dictionary loaded"
    );
    Ok(trie)
}

fn write_bits<W: Write>(writer: &mut W, bits: &RankedBits) -> Result<(), CodecError> {
    writer.write_all(&(bits.len() as u64).to_le_bytes())?;
    for &word in bits.as_raw_words() {
        writer.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

fn read_bits<R: Read>(reader: &mut R, expected_len: usize) -> Result<RankedBits, CodecError> {
    let bit_len = read_u64(reader)? as usize;
    if bit_len != expected_len {
        return Err(CodecError::Corrupt("bit section length mismatch"));
    }
    let word_count = bit_len.div_ceil(64);
    let mut words = Vec::with_capacity(word_count.min(MAX_PREALLOC / 8));
    for _ in 0..word_count {
        words.push(read_u64(reader)?);
    }
    RankedBits::from_raw(bit_len, words)
        .map_err(|_| CodecError::Corrupt("malformed bit section"))
}

/// Read exactly `len` bytes into a fresh vector, growing as bytes arrive
/// rather than trusting `len` with one big reservation.
fn read_byte_vec<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    let read = reader.take(len as u64).read_to_end(&mut buf)?;
    if read < len {
        return Err(CodecError::Truncated);
    }
    Ok(buf)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), CodecError> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::Truncated,
        _ => CodecError::Io(err),
    })
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16, CodecError> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Writer that feeds every byte through a BLAKE3 hasher on the way out.
struct HashingWriter<W: Write> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    fn finish(self) -> (W, blake3::Hash) {
        (self.inner, self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader that feeds every byte through a BLAKE3 hasher on the way in.
struct HashingReader<R: Read> {
    inner: R,
    hasher: blake3::Hasher,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    fn finish(self) -> (R, blake3::Hash) {
        (self.inner, self.hasher.finalize())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}
