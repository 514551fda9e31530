//! File helpers around the in-memory codec.

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

use crate::model::VoxelDocument;
use crate::util::{Error, Result};
use crate::vox::{self, DecodeReport, ReadOptions, WriteOptions};

/// Bytes of an opened file.
enum Source {
    #[cfg(feature = "mmap")]
    Mmap(Mmap),
    Buffer(Vec<u8>),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            #[cfg(feature = "mmap")]
            Self::Mmap(m) => &m[..],
            Self::Buffer(b) => &b[..],
        }
    }
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

fn load(path: &Path) -> Result<Source> {
    let mut file = open_file(path)?;
    let size = file.metadata()?.len();

    #[cfg(feature = "mmap")]
    if size > 0 {
        // Safety: read-only map, dropped once decoding finishes.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        return Ok(Source::Mmap(mmap));
    }

    let mut buf = Vec::with_capacity(size as usize);
    file.read_to_end(&mut buf)?;
    Ok(Source::Buffer(buf))
}

/// Read and decode a .vox file.
pub fn open(path: impl AsRef<Path>) -> Result<VoxelDocument> {
    open_with(path, &ReadOptions::default()).map(DecodeReport::into_document)
}

/// Read and decode a .vox file with explicit options.
pub fn open_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<DecodeReport> {
    let path = path.as_ref();
    tracing::debug!("opening {}", path.display());
    let source = load(path)?;
    vox::decode_with(source.bytes(), options)
}

/// Encode and write a document.
pub fn save(path: impl AsRef<Path>, doc: &VoxelDocument) -> Result<()> {
    save_with(path, doc, &WriteOptions::default())
}

/// Encode and write a document with explicit options.
pub fn save_with(path: impl AsRef<Path>, doc: &VoxelDocument, options: &WriteOptions) -> Result<()> {
    let bytes = vox::encode_with(doc, options)?;
    std::fs::write(path.as_ref(), &bytes)?;
    tracing::debug!("wrote {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(())
}
