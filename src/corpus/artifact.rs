// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The `.slx` index artifact: header, sections, CRC32 footer.
//!
//! The header is 32 bytes of fixed-size fields and tells you where every
//! section lives. The footer is 8 bytes: a CRC32 over everything before it,
//! plus a magic number ("TSLS", the header magic reversed). If the footer is
//! wrong, the file was truncated or corrupted. Don't trust the data.
//!
//! ```text
//! HEADER        [32B]                 magic, version, flags, counts, lengths
//! EMBEDDER_ID   [embedder_id_len]     UTF-8
//! FINGERPRINTS  [fingerprints_len]    count × u64 LE, FNV-1a of each url
//! VECTORS       [vectors_len]         count × dimension × f32 LE
//! FOOTER        [8B]                  crc32 LE + "TSLS"
//! ```
//!
//! `SectionOffsets` is the single source of truth for this layout. Both the
//! writer and the reader go through it.

use std::io::{self, Read, Write};

use crc32fast::Hasher as Crc32Hasher;
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Magic bytes: "SLST" in ASCII (header)
pub const MAGIC: [u8; 4] = *b"SLST";

/// Footer magic: "TSLS" (reversed, marks valid file end)
pub const FOOTER_MAGIC: [u8; 4] = *b"TSLS";

/// Current format version
pub const VERSION: u8 = 1;

// ============================================================================
// LIMITS (refuse absurd headers before allocating)
// ============================================================================

/// Maximum file size: 512 MB
pub const MAX_FILE_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of rows
pub const MAX_COUNT: u32 = 10_000_000;

/// Maximum embedding dimension
pub const MAX_DIMENSION: u32 = 16_384;

/// Maximum embedder id length
pub const MAX_EMBEDDER_ID_LEN: u32 = 256;

// ============================================================================
// ERRORS
// ============================================================================

/// Structural problems with an index artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("file too short: {len} bytes")]
    Truncated { len: usize },

    #[error("file too large: {len} bytes (limit {limit})", limit = MAX_FILE_SIZE)]
    TooLarge { len: usize },

    #[error("invalid magic: expected SLST, got {0:?}")]
    BadMagic([u8; 4]),

    #[error("invalid footer magic: expected TSLS, got {0:?}")]
    BadFooterMagic([u8; 4]),

    #[error("unsupported version {found} (expected {expected})", expected = VERSION)]
    UnsupportedVersion { found: u8 },

    #[error("CRC32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("section lengths disagree with header: {0}")]
    Layout(String),

    #[error("embedder id is not valid UTF-8")]
    EmbedderId,

    #[error(transparent)]
    Io(#[from] io::Error),
}

// ============================================================================
// HEADER
// ============================================================================

/// Artifact header (32 bytes fixed size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u8,
    pub flags: u8,
    pub count: u32,
    pub dimension: u32,
    pub embedder_id_len: u32,
    pub fingerprints_len: u32,
    pub vectors_len: u32,
}

impl IndexHeader {
    // 4 (magic) + 1 (version) + 1 (flags) + 2 (reserved) + 6*4 (u32s) = 32
    pub const SIZE: usize = 32;

    pub fn section_offsets(&self) -> SectionOffsets {
        SectionOffsets::from_header(self)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&[self.version, self.flags])?;
        w.write_all(&[0u8; 2])?; // reserved
        w.write_all(&self.count.to_le_bytes())?;
        w.write_all(&self.dimension.to_le_bytes())?;
        w.write_all(&self.embedder_id_len.to_le_bytes())?;
        w.write_all(&self.fingerprints_len.to_le_bytes())?;
        w.write_all(&self.vectors_len.to_le_bytes())?;
        w.write_all(&[0u8; 4])?; // reserved
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, ArtifactError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(ArtifactError::BadMagic(magic));
        }

        let mut buf = [0u8; 28]; // 32 - 4 (magic)
        r.read_exact(&mut buf)?;

        let u32_at = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        Ok(Self {
            version: buf[0],
            flags: buf[1],
            // buf[2..4] is reserved
            count: u32_at(4),
            dimension: u32_at(8),
            embedder_id_len: u32_at(12),
            fingerprints_len: u32_at(16),
            vectors_len: u32_at(20),
            // buf[24..28] is reserved
        })
    }

    /// Section lengths must follow from `count` and `dimension`.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.version != VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.version,
            });
        }
        if self.count > MAX_COUNT {
            return Err(ArtifactError::Layout(format!(
                "count {} exceeds limit {MAX_COUNT}",
                self.count
            )));
        }
        if self.dimension > MAX_DIMENSION {
            return Err(ArtifactError::Layout(format!(
                "dimension {} exceeds limit {MAX_DIMENSION}",
                self.dimension
            )));
        }
        if self.embedder_id_len > MAX_EMBEDDER_ID_LEN {
            return Err(ArtifactError::Layout(format!(
                "embedder id length {} exceeds limit {MAX_EMBEDDER_ID_LEN}",
                self.embedder_id_len
            )));
        }

        let count = u64::from(self.count);
        let expected_fingerprints = count * 8;
        let expected_vectors = count * u64::from(self.dimension) * 4;
        if u64::from(self.fingerprints_len) != expected_fingerprints {
            return Err(ArtifactError::Layout(format!(
                "fingerprints section is {} bytes, {} rows need {expected_fingerprints}",
                self.fingerprints_len, self.count
            )));
        }
        if u64::from(self.vectors_len) != expected_vectors {
            return Err(ArtifactError::Layout(format!(
                "vectors section is {} bytes, {} rows × {} dims need {expected_vectors}",
                self.vectors_len, self.count, self.dimension
            )));
        }
        Ok(())
    }
}

// ============================================================================
// FOOTER (8 bytes)
// ============================================================================

/// Footer with CRC32 checksum and magic number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFooter {
    /// CRC32 of header + all sections (everything before the footer)
    pub crc32: u32,
}

impl IndexFooter {
    pub const SIZE: usize = 8; // 4 bytes CRC32 + 4 bytes magic

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&FOOTER_MAGIC)?;
        Ok(())
    }

    /// Read the footer from the tail of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < Self::SIZE {
            return Err(ArtifactError::Truncated { len: bytes.len() });
        }

        let start = bytes.len() - Self::SIZE;
        let magic = [
            bytes[start + 4],
            bytes[start + 5],
            bytes[start + 6],
            bytes[start + 7],
        ];
        if magic != FOOTER_MAGIC {
            return Err(ArtifactError::BadFooterMagic(magic));
        }

        let crc32 = u32::from_le_bytes([
            bytes[start],
            bytes[start + 1],
            bytes[start + 2],
            bytes[start + 3],
        ]);
        Ok(Self { crc32 })
    }

    pub fn compute_crc32(data: &[u8]) -> u32 {
        let mut hasher = Crc32Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

// ============================================================================
// SECTION OFFSETS
// ============================================================================

/// Start and end byte offsets of every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffsets {
    pub embedder_id: (usize, usize),
    pub fingerprints: (usize, usize),
    pub vectors: (usize, usize),
    pub footer: (usize, usize),
}

impl SectionOffsets {
    pub fn from_header(h: &IndexHeader) -> Self {
        let mut pos = IndexHeader::SIZE;

        let id_start = pos;
        pos += h.embedder_id_len as usize;
        let id_end = pos;

        let fp_start = pos;
        pos += h.fingerprints_len as usize;
        let fp_end = pos;

        let vec_start = pos;
        pos += h.vectors_len as usize;
        let vec_end = pos;

        Self {
            embedder_id: (id_start, id_end),
            fingerprints: (fp_start, fp_end),
            vectors: (vec_start, vec_end),
            footer: (pos, pos + IndexFooter::SIZE),
        }
    }

    /// Everything before the footer
    pub fn content_size(&self) -> usize {
        self.footer.0
    }

    pub fn total_size(&self) -> usize {
        self.footer.1
    }

    #[inline]
    pub fn slice<'a>(&self, bytes: &'a [u8], section: (usize, usize)) -> Option<&'a [u8]> {
        bytes.get(section.0..section.1)
    }
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// Decoded contents of an index artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexArtifact {
    pub embedder_id: String,
    pub dimension: usize,
    pub fingerprints: Vec<u64>,
    /// Row-major, `fingerprints.len() × dimension`.
    pub vectors: Vec<f32>,
}

impl IndexArtifact {
    pub fn count(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn header(&self) -> IndexHeader {
        IndexHeader {
            version: VERSION,
            flags: 0,
            count: self.count() as u32,
            dimension: self.dimension as u32,
            embedder_id_len: self.embedder_id.len() as u32,
            fingerprints_len: (self.fingerprints.len() * 8) as u32,
            vectors_len: (self.vectors.len() * 4) as u32,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let header = self.header();
        header.validate()?;

        let offsets = header.section_offsets();
        let mut out = Vec::with_capacity(offsets.total_size());

        header.write(&mut out)?;
        out.extend_from_slice(self.embedder_id.as_bytes());
        for fp in &self.fingerprints {
            out.extend_from_slice(&fp.to_le_bytes());
        }
        for v in &self.vectors {
            out.extend_from_slice(&v.to_le_bytes());
        }
        debug_assert_eq!(out.len(), offsets.content_size());

        let footer = IndexFooter {
            crc32: IndexFooter::compute_crc32(&out),
        };
        footer.write(&mut out)?;

        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(ArtifactError::TooLarge { len: bytes.len() });
        }
        if bytes.len() < IndexHeader::SIZE + IndexFooter::SIZE {
            return Err(ArtifactError::Truncated { len: bytes.len() });
        }

        let header = IndexHeader::read(&mut &bytes[..IndexHeader::SIZE])?;
        header.validate()?;

        let offsets = header.section_offsets();
        if offsets.total_size() != bytes.len() {
            return Err(ArtifactError::Layout(format!(
                "header describes {} bytes, file has {}",
                offsets.total_size(),
                bytes.len()
            )));
        }

        let footer = IndexFooter::read(bytes)?;
        let computed = IndexFooter::compute_crc32(&bytes[..offsets.content_size()]);
        if footer.crc32 != computed {
            return Err(ArtifactError::ChecksumMismatch {
                stored: footer.crc32,
                computed,
            });
        }

        let section = |range: (usize, usize)| {
            offsets
                .slice(bytes, range)
                .ok_or_else(|| ArtifactError::Layout("section out of bounds".to_string()))
        };

        let embedder_id = std::str::from_utf8(section(offsets.embedder_id)?)
            .map_err(|_| ArtifactError::EmbedderId)?
            .to_string();

        let fingerprints = section(offsets.fingerprints)?
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();

        let vectors = section(offsets.vectors)?
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            embedder_id,
            dimension: header.dimension as usize,
            fingerprints,
            vectors,
        })
    }
}
