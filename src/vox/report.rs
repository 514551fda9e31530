//! Non-fatal decode findings.

use std::fmt;

use crate::chunk::ChunkTag;
use crate::model::VoxelDocument;

/// Something odd the decoder tolerated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    /// PACK declared a different number of models than were decoded.
    ModelCountMismatch { expected: usize, actual: usize },
    /// Chunk with an unrecognised tag, skipped by its declared size.
    UnknownChunk { tag: ChunkTag, offset: usize },
    /// Reserved field that is not `0xFFFFFFFF`.
    ReservedFieldMismatch { tag: ChunkTag, offset: usize, value: u32 },
    /// A material id defined more than once; the later one wins.
    DuplicateMaterial { id: u8 },
    /// Bytes after the MAIN chunk.
    TrailingBytes { offset: usize, len: usize },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelCountMismatch { expected, actual } => {
                write!(f, "PACK declares {} models, found {}", expected, actual)
            }
            Self::UnknownChunk { tag, offset } => {
                write!(f, "skipped unknown chunk {} at offset {}", tag, offset)
            }
            Self::ReservedFieldMismatch { tag, offset, value } => write!(
                f,
                "{} at offset {}: reserved field is {:#010x}, expected 0xffffffff",
                tag, offset, value
            ),
            Self::DuplicateMaterial { id } => write!(f, "material {} defined more than once", id),
            Self::TrailingBytes { offset, len } => {
                write!(f, "{} trailing bytes after MAIN at offset {}", len, offset)
            }
        }
    }
}

/// Decoded document plus the warnings raised on the way.
#[derive(Clone, Debug)]
pub struct DecodeReport {
    pub document: VoxelDocument,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodeReport {
    /// Check if decoding raised no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drop the warnings.
    pub fn into_document(self) -> VoxelDocument {
        self.document
    }
}
