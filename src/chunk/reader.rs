//! Chunk framing reader.
//!
//! ```text
//! +------------------+
//! | Tag              |  4 bytes ("MAIN", "SIZE", ...)
//! +------------------+
//! | Content size N   |  u32 LE
//! +------------------+
//! | Children size M  |  u32 LE
//! +------------------+
//! | Content          |  N bytes
//! +------------------+
//! | Children         |  M bytes of nested chunks
//! +------------------+
//! ```
//!
//! Chunks are borrowed views into the input buffer; content is only
//! interpreted by whoever dispatches on the tag.

use super::format::{ChunkTag, CHUNK_HEADER_SIZE};
use crate::core::ByteReader;
use crate::util::{Error, Result};

/// A framed chunk borrowed from the input buffer.
#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    tag: ChunkTag,
    offset: usize,
    content: &'a [u8],
    children: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Chunk tag.
    #[inline]
    pub fn tag(&self) -> ChunkTag {
        self.tag
    }

    /// Absolute offset of the chunk header.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute offset of the first content byte.
    #[inline]
    pub fn content_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_SIZE
    }

    /// Absolute offset of the first children byte.
    #[inline]
    pub fn children_offset(&self) -> usize {
        self.content_offset() + self.content.len()
    }

    /// Raw content bytes.
    #[inline]
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Raw children bytes.
    #[inline]
    pub fn children_bytes(&self) -> &'a [u8] {
        self.children
    }

    /// Check if the chunk declares nested children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Header plus content plus children, in bytes.
    #[inline]
    pub fn total_len(&self) -> usize {
        CHUNK_HEADER_SIZE + self.content.len() + self.children.len()
    }

    /// Reader over the content with absolute offsets.
    pub fn content_reader(&self) -> ByteReader<'a> {
        ByteReader::with_base(self.content, self.content_offset())
    }

    /// Iterate over the immediate children without interpreting them.
    pub fn children(&self) -> ChunkIter<'a> {
        ChunkIter {
            reader: ByteReader::with_base(self.children, self.children_offset()),
            parent: self.tag,
            done: false,
        }
    }

    /// Collect the immediate children, failing on the first framing error.
    pub fn child_chunks(&self) -> Result<Vec<Chunk<'a>>> {
        self.children().collect()
    }

    /// Recursively check that every nested chunk fits its parent exactly.
    pub fn validate_children(&self) -> Result<()> {
        for child in self.children() {
            child?.validate_children()?;
        }
        Ok(())
    }
}

/// Read one chunk from the reader's current position.
///
/// Fails with [`Error::TruncatedInput`] when the declared sizes run past the
/// end of the input.
pub fn read_chunk<'a>(reader: &mut ByteReader<'a>) -> Result<Chunk<'a>> {
    let offset = reader.offset();
    if reader.remaining() < CHUNK_HEADER_SIZE {
        return Err(Error::TruncatedInput {
            offset,
            needed: CHUNK_HEADER_SIZE,
            available: reader.remaining(),
        });
    }

    let start = reader.clone();
    let tag = ChunkTag(reader.read_u32()?);
    let content_size = reader.read_u32()? as usize;
    let children_size = reader.read_u32()? as usize;

    let needed = CHUNK_HEADER_SIZE
        .saturating_add(content_size)
        .saturating_add(children_size);
    if needed > start.remaining() {
        *reader = start;
        return Err(Error::TruncatedInput {
            offset,
            needed,
            available: reader.remaining(),
        });
    }

    let content = reader.read_bytes(content_size)?;
    let children = reader.read_bytes(children_size)?;
    tracing::trace!(
        "chunk {} at {}: content {} bytes, children {} bytes",
        tag, offset, content_size, children_size
    );

    Ok(Chunk { tag, offset, content, children })
}

/// Iterator over the chunks packed in a parent's children region.
///
/// Stops after the first error.
pub struct ChunkIter<'a> {
    reader: ByteReader<'a>,
    parent: ChunkTag,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    /// Bytes not yet consumed from the children region.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }

        let offset = self.reader.offset();
        let result = read_chunk(&mut self.reader).map_err(|e| match e {
            // Inside a parent, running out of bytes means the parent's
            // children size disagrees with the nested chunks.
            Error::TruncatedInput { needed, available, .. } => Error::ChunkSizeMismatch {
                tag: self.parent,
                offset,
                reason: format!(
                    "nested chunk needs {} bytes but only {} of the declared children size remain",
                    needed, available
                ),
            },
            other => other,
        });
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::write_chunk;

    #[test]
    fn test_read_simple_chunk() {
        let bytes = write_chunk(ChunkTag::PACK, &3u32.to_le_bytes(), &[]);
        let mut r = ByteReader::new(&bytes);
        let chunk = read_chunk(&mut r).unwrap();
        assert_eq!(chunk.tag(), ChunkTag::PACK);
        assert_eq!(chunk.content(), &[3, 0, 0, 0]);
        assert!(!chunk.has_children());
        assert_eq!(chunk.total_len(), bytes.len());
        assert!(r.is_empty());
    }

    #[test]
    fn test_nested_children() {
        let a = write_chunk(ChunkTag::PACK, &1u32.to_le_bytes(), &[]);
        let b = write_chunk(ChunkTag::SIZE, &[0u8; 12], &[]);
        let mut children = a.clone();
        children.extend_from_slice(&b);
        let main = write_chunk(ChunkTag::MAIN, &[], &children);

        let chunk = read_chunk(&mut ByteReader::new(&main)).unwrap();
        let kids = chunk.child_chunks().unwrap();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].tag(), ChunkTag::PACK);
        assert_eq!(kids[0].offset(), 12);
        assert_eq!(kids[1].tag(), ChunkTag::SIZE);
        assert_eq!(kids[1].offset(), 12 + a.len());
        assert_eq!(kids[1].content_offset(), 24 + a.len());
        chunk.validate_children().unwrap();
    }

    #[test]
    fn test_truncated_chunk() {
        let mut bytes = write_chunk(ChunkTag::SIZE, &[0u8; 12], &[]);
        bytes.truncate(bytes.len() - 1);
        let err = read_chunk(&mut ByteReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { offset: 0, needed: 24, available: 23 }));
    }

    #[test]
    fn test_children_size_too_large() {
        // Parent declares 8 spare bytes after its only child.
        let child = write_chunk(ChunkTag::PACK, &1u32.to_le_bytes(), &[]);
        let mut children = child.clone();
        children.extend_from_slice(&[0u8; 8]);
        let main = write_chunk(ChunkTag::MAIN, &[], &children);

        let chunk = read_chunk(&mut ByteReader::new(&main)).unwrap();
        let err = chunk.child_chunks().unwrap_err();
        assert!(matches!(err, Error::ChunkSizeMismatch { tag: ChunkTag::MAIN, .. }));
    }

    #[test]
    fn test_child_overruns_parent() {
        let child = write_chunk(ChunkTag::SIZE, &[0u8; 12], &[]);
        // Chop the last 4 bytes of the child off the parent's children region.
        let main = write_chunk(ChunkTag::MAIN, &[], &child[..child.len() - 4]);

        let chunk = read_chunk(&mut ByteReader::new(&main)).unwrap();
        let mut iter = chunk.children();
        let err = iter.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::ChunkSizeMismatch { offset: 12, .. }));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_deep_mismatch_found_by_validate() {
        let bad_grandchild = &write_chunk(ChunkTag::PACK, &[1, 0, 0, 0], &[])[..10];
        let child = write_chunk(ChunkTag::from_bytes(*b"GRPX"), &[], bad_grandchild);
        let main = write_chunk(ChunkTag::MAIN, &[], &child);

        let chunk = read_chunk(&mut ByteReader::new(&main)).unwrap();
        assert_eq!(chunk.child_chunks().unwrap().len(), 1);
        assert!(matches!(
            chunk.validate_children(),
            Err(Error::ChunkSizeMismatch { .. })
        ));
    }
}
