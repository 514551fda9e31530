//! Bytes -> [`VoxelDocument`].
//!
//! MAIN's children are walked once, in file order:
//!
//! ```text
//! Start --PACK--> Models
//! Start/Models --SIZE--> AwaitXyzi --XYZI--> Models
//! Start/Models --anything else--> Tail
//! ```
//!
//! Scene node records are only collected during the walk; the graph is
//! resolved after MAIN is exhausted.

use super::options::ReadOptions;
use super::report::{DecodeReport, DecodeWarning};
use crate::chunk::{read_chunk, Chunk, ChunkTag, CURRENT_VERSION, RESERVED_ID, VOX_MAGIC};
use crate::core::{decode_dict, ByteReader, Dict};
use crate::model::{
    Camera, IndexMap, Layer, LegacyMaterial, LegacyProperty, Material, MaterialKind, Model, Note,
    Palette, RenderObject, Rgba, Size, Voxel, VoxelDocument, PALETTE_SIZE, TOTAL_POWER_BIT,
};
use crate::scene::{
    Frame, GroupNode, NodeRecord, SceneGraphBuilder, ShapeModel, ShapeRecord, TransformNode,
};
use crate::util::{Error, Result};

/// Decode a .vox file held in memory. Warnings are logged and dropped.
pub fn decode(data: &[u8]) -> Result<VoxelDocument> {
    decode_with(data, &ReadOptions::default()).map(DecodeReport::into_document)
}

/// Decode a .vox file held in memory, returning the warnings alongside.
#[tracing::instrument(skip_all, fields(len = data.len()))]
pub fn decode_with(data: &[u8], options: &ReadOptions) -> Result<DecodeReport> {
    let mut reader = ByteReader::new(data);

    let magic = reader
        .read_array::<4>()
        .map_err(|_| Error::header("file shorter than the magic bytes"))?;
    if &magic != VOX_MAGIC {
        return Err(Error::header(format!("bad magic {:02x?}, expected \"VOX \"", magic)));
    }
    let version = reader
        .read_u32()
        .map_err(|_| Error::header("missing version word"))?;
    if version != CURRENT_VERSION {
        tracing::debug!(version, "unusual format version");
    }

    let main = read_chunk(&mut reader)?;
    if main.tag() != ChunkTag::MAIN {
        return Err(Error::MissingMainChunk {
            offset: main.offset(),
            found: main.tag(),
        });
    }
    if !main.content().is_empty() {
        tracing::trace!(len = main.content().len(), "ignoring MAIN content");
    }

    let mut decoder = Decoder::new(version, options);
    for chunk in main.children() {
        decoder.dispatch(chunk?)?;
    }

    if !reader.is_empty() {
        decoder.warn(DecodeWarning::TrailingBytes {
            offset: reader.offset(),
            len: reader.remaining(),
        });
    }

    decoder.finish()
}

/// Position in the MAIN child sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Nothing read yet.
    Start,
    /// Inside the model section.
    Models,
    /// A SIZE was read; its XYZI must come next.
    AwaitXyzi { size: Size, offset: usize },
    /// Past the model section.
    Tail,
}

struct Decoder<'o> {
    options: &'o ReadOptions,
    state: State,
    declared_models: Option<usize>,
    palette_seen: bool,
    doc: VoxelDocument,
    nodes: SceneGraphBuilder,
    warnings: Vec<DecodeWarning>,
}

impl<'o> Decoder<'o> {
    fn new(version: u32, options: &'o ReadOptions) -> Self {
        Self {
            options,
            state: State::Start,
            declared_models: None,
            palette_seen: false,
            doc: VoxelDocument {
                version,
                ..VoxelDocument::default()
            },
            nodes: SceneGraphBuilder::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: DecodeWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Decode one MAIN child. Content errors are tagged with the chunk.
    fn dispatch(&mut self, chunk: Chunk<'_>) -> Result<()> {
        let (tag, offset) = (chunk.tag(), chunk.offset());
        self.step(chunk).map_err(|e| e.in_chunk(tag, offset))
    }

    fn step(&mut self, chunk: Chunk<'_>) -> Result<()> {
        let tag = chunk.tag();

        if let State::AwaitXyzi { size, offset } = self.state {
            if tag != ChunkTag::XYZI {
                return Err(Error::UnpairedSizeChunk { offset, found: Some(tag) });
            }
            let index = self.doc.models.len();
            let model = decode_xyzi(&chunk, size, index)?;
            tracing::debug!(index, voxels = model.voxel_count(), "model");
            self.doc.models.push(model);
            self.state = State::Models;
            return Ok(());
        }

        if !tag.is_known() {
            self.warn(DecodeWarning::UnknownChunk { tag, offset: chunk.offset() });
            return Ok(());
        }
        chunk.validate_children()?;
        if chunk.has_children() {
            tracing::trace!("ignoring children of {} at {}", tag, chunk.offset());
        }

        match tag {
            ChunkTag::PACK => {
                if self.state != State::Start {
                    return Err(unexpected(&chunk, "PACK must precede every model"));
                }
                let count = chunk.content_reader().read_u32()? as usize;
                tracing::debug!(count, "PACK");
                self.declared_models = Some(count);
                self.state = State::Models;
            }
            ChunkTag::SIZE => {
                if self.state == State::Tail {
                    return Err(unexpected(&chunk, "SIZE after the model section"));
                }
                let size = decode_size(&chunk)?;
                self.state = State::AwaitXyzi { size, offset: chunk.offset() };
            }
            ChunkTag::XYZI => {
                return Err(unexpected(&chunk, "XYZI without a preceding SIZE"));
            }
            ChunkTag::MAIN => {
                return Err(unexpected(&chunk, "MAIN nested inside MAIN"));
            }
            _ => {
                self.state = State::Tail;
                self.decode_tail(&chunk)?;
            }
        }
        Ok(())
    }

    fn decode_tail(&mut self, chunk: &Chunk<'_>) -> Result<()> {
        match chunk.tag() {
            ChunkTag::RGBA => {
                if self.palette_seen {
                    tracing::debug!("second RGBA chunk replaces the first");
                }
                self.doc.palette = decode_rgba(chunk)?;
                self.palette_seen = true;
            }
            ChunkTag::IMAP => self.doc.index_map = Some(decode_imap(chunk)?),
            ChunkTag::MATT => {
                let (id, material) = decode_matt(chunk)?;
                self.insert_material(id, Material::Legacy(material));
            }
            ChunkTag::MATL => {
                let (id, props) = decode_matl(chunk)?;
                self.insert_material(id, Material::Modern(props));
            }
            ChunkTag::NTRN => {
                let node = self.decode_ntrn(chunk)?;
                self.nodes.push(NodeRecord::Transform(node));
            }
            ChunkTag::NGRP => self.nodes.push(NodeRecord::Group(decode_ngrp(chunk)?)),
            ChunkTag::NSHP => self.nodes.push(NodeRecord::Shape(decode_nshp(chunk)?)),
            ChunkTag::LAYR => {
                let layer = self.decode_layr(chunk)?;
                self.doc.layers.push(layer);
            }
            ChunkTag::ROBJ => self.doc.render_objects.push(RenderObject {
                attributes: decode_dict(&mut chunk.content_reader())?,
            }),
            ChunkTag::RCAM => {
                let mut r = chunk.content_reader();
                let id = r.read_u32()?;
                let attributes = decode_dict(&mut r)?;
                self.doc.cameras.push(Camera { id, attributes });
            }
            ChunkTag::NOTE => self.doc.notes.push(Note {
                attributes: decode_dict(&mut chunk.content_reader())?,
            }),
            other => tracing::trace!("no handler for {}", other),
        }
        Ok(())
    }

    fn insert_material(&mut self, id: u8, material: Material) {
        if self.doc.materials.insert(id, material).is_some() {
            self.warn(DecodeWarning::DuplicateMaterial { id });
        }
    }

    /// Read a reserved id field, warning when it is not `0xFFFFFFFF`.
    fn read_reserved(&mut self, tag: ChunkTag, r: &mut ByteReader<'_>) -> Result<()> {
        let offset = r.offset();
        let value = r.read_u32()?;
        if value != RESERVED_ID {
            self.warn(DecodeWarning::ReservedFieldMismatch { tag, offset, value });
        }
        Ok(())
    }

    fn decode_ntrn(&mut self, chunk: &Chunk<'_>) -> Result<TransformNode> {
        let mut r = chunk.content_reader();
        let id = r.read_u32()?;
        let attributes = decode_dict(&mut r)?;
        let child_id = r.read_u32()?;
        self.read_reserved(ChunkTag::NTRN, &mut r)?;
        let layer_id = r.read_u32()?;
        let frame_count = r.read_u32()?;

        let mut frames = Vec::new();
        for _ in 0..frame_count {
            frames.push(Frame::from_dict(id, decode_dict(&mut r)?)?);
        }
        tracing::trace!(id, child_id, layer_id, frames = frames.len(), "nTRN");
        Ok(TransformNode { id, attributes, child_id, layer_id, frames })
    }

    fn decode_layr(&mut self, chunk: &Chunk<'_>) -> Result<Layer> {
        let mut r = chunk.content_reader();
        let id = r.read_u32()?;
        let attributes = decode_dict(&mut r)?;
        self.read_reserved(ChunkTag::LAYR, &mut r)?;
        Ok(Layer { id, attributes })
    }

    fn finish(mut self) -> Result<DecodeReport> {
        if let State::AwaitXyzi { offset, .. } = self.state {
            return Err(Error::UnpairedSizeChunk { offset, found: None });
        }

        let expected = self.declared_models.unwrap_or(1);
        let actual = self.doc.models.len();
        if expected != actual {
            if self.options.strict_model_count {
                return Err(Error::ModelCountMismatch { expected, actual });
            }
            self.warn(DecodeWarning::ModelCountMismatch { expected, actual });
        }

        self.doc.scene = self.nodes.build(actual)?;

        tracing::debug!(
            models = actual,
            materials = self.doc.materials.len(),
            layers = self.doc.layers.len(),
            warnings = self.warnings.len(),
            "decoded document"
        );
        Ok(DecodeReport {
            document: self.doc,
            warnings: self.warnings,
        })
    }
}

fn unexpected(chunk: &Chunk<'_>, reason: &'static str) -> Error {
    Error::UnexpectedChunk {
        tag: chunk.tag(),
        offset: chunk.offset(),
        reason,
    }
}

/// Fail unless `count` records of `record_len` bytes fit in the reader.
fn ensure_records(r: &ByteReader<'_>, count: u32, record_len: usize) -> Result<()> {
    let needed = (count as usize).saturating_mul(record_len);
    if needed > r.remaining() {
        return Err(Error::TruncatedInput {
            offset: r.offset(),
            needed,
            available: r.remaining(),
        });
    }
    Ok(())
}

fn decode_size(chunk: &Chunk<'_>) -> Result<Size> {
    let mut r = chunk.content_reader();
    Ok(Size::new(r.read_u32()?, r.read_u32()?, r.read_u32()?))
}

fn decode_xyzi(chunk: &Chunk<'_>, size: Size, index: usize) -> Result<Model> {
    chunk.validate_children()?;
    let mut r = chunk.content_reader();
    let count = r.read_u32()?;
    ensure_records(&r, count, 4)?;

    let mut voxels = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let [x, y, z, i] = r.read_array::<4>()?;
        voxels.push(Voxel::new(x, y, z, i));
    }
    let model = Model::with_voxels(size, voxels);
    model.validate(index)?;
    Ok(model)
}

fn decode_rgba(chunk: &Chunk<'_>) -> Result<Palette> {
    let mut r = chunk.content_reader();
    let bytes = r.read_bytes(PALETTE_SIZE * 4)?;
    let mut slots = [Rgba::TRANSPARENT; PALETTE_SIZE];
    bytemuck::cast_slice_mut::<Rgba, u8>(&mut slots).copy_from_slice(bytes);
    Ok(Palette::from_wire_slots(&slots))
}

fn decode_imap(chunk: &Chunk<'_>) -> Result<IndexMap> {
    let mut r = chunk.content_reader();
    Ok(IndexMap(r.read_bytes(IndexMap::LEN)?.to_vec()))
}

fn material_id(r: &mut ByteReader<'_>) -> Result<u8> {
    let offset = r.offset();
    let id = r.read_u32()?;
    u8::try_from(id).map_err(|_| Error::InvalidMaterial {
        offset,
        reason: format!("material id {} out of range 0..=255", id),
    })
}

fn decode_matt(chunk: &Chunk<'_>) -> Result<(u8, LegacyMaterial)> {
    let mut r = chunk.content_reader();
    let id = material_id(&mut r)?;
    let kind_offset = r.offset();
    let kind_word = r.read_u32()?;
    let kind = MaterialKind::from_u32(kind_word).ok_or_else(|| Error::InvalidMaterial {
        offset: kind_offset,
        reason: format!("unknown material type {}", kind_word),
    })?;
    let weight = r.read_f32()?;
    let bits = r.read_u32()?;

    let mut material = LegacyMaterial::new(kind, weight);
    for property in LegacyProperty::ALL {
        if bits & property.bit() != 0 {
            material.properties.insert(property, r.read_f32()?);
        }
    }
    material.is_total_power = bits & TOTAL_POWER_BIT != 0;
    Ok((id, material))
}

fn decode_matl(chunk: &Chunk<'_>) -> Result<(u8, Dict)> {
    let mut r = chunk.content_reader();
    let id = material_id(&mut r)?;
    Ok((id, decode_dict(&mut r)?))
}

fn decode_ngrp(chunk: &Chunk<'_>) -> Result<GroupNode> {
    let mut r = chunk.content_reader();
    let id = r.read_u32()?;
    let attributes = decode_dict(&mut r)?;
    let count = r.read_u32()?;
    ensure_records(&r, count, 4)?;
    let children = (0..count).map(|_| r.read_u32()).collect::<Result<Vec<_>>>()?;
    Ok(GroupNode { id, attributes, children })
}

fn decode_nshp(chunk: &Chunk<'_>) -> Result<ShapeRecord> {
    let mut r = chunk.content_reader();
    let id = r.read_u32()?;
    let attributes = decode_dict(&mut r)?;
    let count = r.read_u32()?;
    // Model id plus an empty dictionary at minimum.
    ensure_records(&r, count, 8)?;

    let mut models = Vec::new();
    for _ in 0..count {
        let model_id = r.read_u32()?;
        let attributes = decode_dict(&mut r)?;
        models.push(ShapeModel { model_id, attributes });
    }
    Ok(ShapeRecord { id, attributes, models })
}
