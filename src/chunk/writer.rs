//! Chunk framing writer.
//!
//! Content and children sizes are header prefixes, so a chunk can only be
//! emitted once its content and every nested child are fully serialized.
//! [`ChunkBuilder`] buffers both regions and writes the header last.

use super::format::{ChunkTag, CHUNK_HEADER_SIZE};
use crate::core::ByteWriter;

/// Frame already-serialized content and children into one chunk.
pub fn write_chunk(tag: ChunkTag, content: &[u8], children: &[u8]) -> Vec<u8> {
    let mut out = ByteWriter::with_capacity(CHUNK_HEADER_SIZE + content.len() + children.len());
    write_chunk_into(&mut out, tag, content, children);
    out.into_inner()
}

/// Append a framed chunk to `out`.
pub fn write_chunk_into(out: &mut ByteWriter, tag: ChunkTag, content: &[u8], children: &[u8]) {
    out.write_u32(tag.0);
    out.write_len(content.len());
    out.write_len(children.len());
    out.write_bytes(content);
    out.write_bytes(children);
}

/// Buffered chunk under construction.
#[derive(Clone, Debug)]
pub struct ChunkBuilder {
    tag: ChunkTag,
    content: ByteWriter,
    children: ByteWriter,
    child_count: usize,
}

impl ChunkBuilder {
    /// Start a chunk with the given tag.
    pub fn new(tag: ChunkTag) -> Self {
        Self {
            tag,
            content: ByteWriter::new(),
            children: ByteWriter::new(),
            child_count: 0,
        }
    }

    /// Chunk tag.
    #[inline]
    pub fn tag(&self) -> ChunkTag {
        self.tag
    }

    /// Writer for the content region.
    #[inline]
    pub fn content(&mut self) -> &mut ByteWriter {
        &mut self.content
    }

    /// Builder-style content setter.
    pub fn with_content(mut self, f: impl FnOnce(&mut ByteWriter)) -> Self {
        f(&mut self.content);
        self
    }

    /// Append a finished child chunk.
    pub fn push_child(&mut self, child: ChunkBuilder) {
        let ChunkBuilder { tag, content, children, .. } = child;
        write_chunk_into(&mut self.children, tag, content.as_bytes(), children.as_bytes());
        self.child_count += 1;
    }

    /// Append a child that is already framed.
    pub fn push_raw_child(&mut self, framed: &[u8]) {
        self.children.write_bytes(framed);
        self.child_count += 1;
    }

    /// Number of children appended so far.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    /// Total framed size in bytes.
    pub fn encoded_len(&self) -> usize {
        CHUNK_HEADER_SIZE + self.content.len() + self.children.len()
    }

    /// Append the framed chunk to `out`.
    pub fn finish_into(self, out: &mut ByteWriter) {
        write_chunk_into(out, self.tag, self.content.as_bytes(), self.children.as_bytes());
    }

    /// Frame the chunk.
    pub fn finish(self) -> Vec<u8> {
        let mut out = ByteWriter::with_capacity(self.encoded_len());
        self.finish_into(&mut out);
        out.into_inner()
    }
}
