//! Error types for the voxfile library.

use std::path::PathBuf;
use thiserror::Error;

use crate::chunk::ChunkTag;

/// Main error type for .vox decoding and encoding.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad magic bytes or missing version word at the start of the file
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Fewer bytes remain than a field or chunk requires
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Nested chunks do not land exactly on the parent's children boundary
    #[error("Chunk size mismatch in {tag} children at offset {offset}: {reason}")]
    ChunkSizeMismatch {
        tag: ChunkTag,
        offset: usize,
        reason: String,
    },

    /// The top-level chunk is not MAIN
    #[error("Expected MAIN chunk at offset {offset}, found {found}")]
    MissingMainChunk { offset: usize, found: ChunkTag },

    /// Field-level failure inside a chunk's content
    #[error("In {tag} chunk at offset {offset}: {source}")]
    ChunkContent {
        tag: ChunkTag,
        offset: usize,
        source: Box<Error>,
    },

    /// Dictionary length prefix exceeds the remaining bytes
    #[error("Invalid dictionary encoding at offset {offset}: {reason}")]
    InvalidDictEncoding { offset: usize, reason: String },

    /// SIZE chunk not immediately followed by XYZI
    #[error("SIZE chunk at offset {offset} is not followed by XYZI (found {})", .found.map(|t| t.to_string()).unwrap_or_else(|| "end of MAIN".to_string()))]
    UnpairedSizeChunk {
        offset: usize,
        found: Option<ChunkTag>,
    },

    /// Chunk appears where the stream order forbids it
    #[error("Unexpected {tag} chunk at offset {offset}: {reason}")]
    UnexpectedChunk {
        tag: ChunkTag,
        offset: usize,
        reason: &'static str,
    },

    /// Voxel outside its model bounds or using the reserved colour index
    #[error("Invalid voxel {index} in model {model}: {reason}")]
    InvalidVoxel {
        model: usize,
        index: usize,
        reason: String,
    },

    /// Material id or legacy material type out of range
    #[error("Invalid material at offset {offset}: {reason}")]
    InvalidMaterial { offset: usize, reason: String },

    /// Palette entry 0 is reserved
    #[error("Palette index {0} is reserved")]
    InvalidPaletteIndex(u8),

    /// IMAP chunk that is not exactly 256 bytes
    #[error("Index map has {len} entries, expected 256")]
    InvalidIndexMap { len: usize },

    /// Shape node does not carry exactly one model entry
    #[error("Shape node {node_id} has {count} model entries, expected 1")]
    InvalidShapeModelCount { node_id: u32, count: usize },

    /// Shape node references a model that does not exist
    #[error("Shape node {node_id} references model {model_id} (model count: {model_count})")]
    InvalidModelReference {
        node_id: u32,
        model_id: u32,
        model_count: usize,
    },

    /// Two scene-graph records share a node id
    #[error("Duplicate scene node id {node_id}")]
    DuplicateNodeId { node_id: u32 },

    /// Transform or group references a node that does not exist
    #[error("Node {node_id} references missing node {child_id}")]
    DanglingNodeReference { node_id: u32, child_id: u32 },

    /// The node reference graph contains a cycle
    #[error("Scene graph cycle through node {node_id}")]
    CyclicSceneGraph { node_id: u32 },

    /// A node is listed as a child more than once
    #[error("Node {node_id} has more than one parent ({first_parent} and {second_parent})")]
    SharedSceneNode {
        node_id: u32,
        first_parent: u32,
        second_parent: u32,
    },

    /// Composed translation leaves the i32 range
    #[error("Translation overflow below transform node {node_id}")]
    TransformOverflow { node_id: u32 },

    /// Packed rotation byte does not describe a signed permutation matrix
    #[error("Invalid rotation byte {byte:#04x}{}", .node_id.map(|id| format!(" in node {}", id)).unwrap_or_default())]
    InvalidRotationByte { byte: u8, node_id: Option<u32> },

    /// Matrix is not a signed permutation matrix
    #[error("Matrix {0:?} is not a signed permutation matrix")]
    InvalidRotationMatrix([[i8; 3]; 3]),

    /// `_r` / `_t` frame attribute cannot be parsed
    #[error("Node {node_id}: invalid frame attribute {key}={value:?}")]
    InvalidFrameAttribute {
        node_id: u32,
        key: &'static str,
        value: String,
    },

    /// PACK count does not match decoded models (strict mode only)
    #[error("PACK declares {expected} models, found {actual}")]
    ModelCountMismatch { expected: usize, actual: usize },

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    /// Create a dictionary encoding error.
    pub fn dict(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDictEncoding {
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the enclosing chunk to errors that only carry a byte offset.
    pub fn in_chunk(self, tag: ChunkTag, offset: usize) -> Self {
        match self {
            Self::TruncatedInput { .. } | Self::InvalidDictEncoding { .. } => Self::ChunkContent {
                tag,
                offset,
                source: Box::new(self),
            },
            other => other,
        }
    }

    /// Tag of the chunk whose content failed to decode.
    pub fn chunk_tag(&self) -> Option<ChunkTag> {
        match self {
            Self::ChunkContent { tag, .. }
            | Self::ChunkSizeMismatch { tag, .. }
            | Self::UnexpectedChunk { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    /// The underlying error, without chunk context.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::ChunkContent { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Byte offset the error refers to, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::ChunkContent { source, .. } => source.offset(),
            Self::TruncatedInput { offset, .. }
            | Self::ChunkSizeMismatch { offset, .. }
            | Self::MissingMainChunk { offset, .. }
            | Self::InvalidDictEncoding { offset, .. }
            | Self::UnpairedSizeChunk { offset, .. }
            | Self::UnexpectedChunk { offset, .. }
            | Self::InvalidMaterial { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Result type alias for voxfile operations.
pub type Result<T> = std::result::Result<T, Error>;
