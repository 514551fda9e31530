//! .vox format constants and chunk tags.

use std::fmt;

/// Magic bytes at the start of a .vox file.
pub const VOX_MAGIC: &[u8; 4] = b"VOX ";

/// Format version written by current MagicaVoxel releases.
pub const CURRENT_VERSION: u32 = 150;

/// Size of the file header (magic + version) in bytes.
pub const FILE_HEADER_SIZE: usize = 8;

/// Size of a chunk header (tag + content size + children size) in bytes.
pub const CHUNK_HEADER_SIZE: usize = 12;

/// Value of the reserved id fields in nTRN and LAYR chunks.
pub const RESERVED_ID: u32 = u32::MAX;

/// Four-character chunk identifier.
///
/// Stored as the little-endian u32 of its ASCII bytes, so writing the value
/// little-endian reproduces the tag text in file order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkTag(pub u32);

impl ChunkTag {
    pub const MAIN: Self = Self::from_bytes(*b"MAIN");
    pub const PACK: Self = Self::from_bytes(*b"PACK");
    pub const SIZE: Self = Self::from_bytes(*b"SIZE");
    pub const XYZI: Self = Self::from_bytes(*b"XYZI");
    pub const RGBA: Self = Self::from_bytes(*b"RGBA");
    pub const MATT: Self = Self::from_bytes(*b"MATT");
    pub const MATL: Self = Self::from_bytes(*b"MATL");
    pub const ROBJ: Self = Self::from_bytes(*b"rOBJ");
    pub const RCAM: Self = Self::from_bytes(*b"rCAM");
    pub const IMAP: Self = Self::from_bytes(*b"IMAP");
    pub const NOTE: Self = Self::from_bytes(*b"NOTE");
    pub const NTRN: Self = Self::from_bytes(*b"nTRN");
    pub const NGRP: Self = Self::from_bytes(*b"nGRP");
    pub const NSHP: Self = Self::from_bytes(*b"nSHP");
    pub const LAYR: Self = Self::from_bytes(*b"LAYR");

    /// Build a tag from its four ASCII bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// The tag's bytes in file order.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Check if this is one of the tags the codec understands.
    pub fn is_known(self) -> bool {
        matches!(
            self,
            Self::MAIN
                | Self::PACK
                | Self::SIZE
                | Self::XYZI
                | Self::RGBA
                | Self::MATT
                | Self::MATL
                | Self::ROBJ
                | Self::RCAM
                | Self::IMAP
                | Self::NOTE
                | Self::NTRN
                | Self::NGRP
                | Self::NSHP
                | Self::LAYR
        )
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({})", self)
    }
}

impl From<[u8; 4]> for ChunkTag {
    fn from(bytes: [u8; 4]) -> Self {
        Self::from_bytes(bytes)
    }
}
