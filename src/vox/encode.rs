//! [`VoxelDocument`] -> bytes.
//!
//! Chunk order inside MAIN:
//!
//! ```text
//! PACK? { SIZE XYZI }* RGBA IMAP? MATT/MATL* nTRN/nGRP/nSHP* LAYR* rOBJ* rCAM* NOTE*
//! ```
//!
//! Every child is fully buffered before MAIN's header is written.

use super::options::{MaterialPolicy, WriteOptions};
use crate::chunk::{ChunkBuilder, ChunkTag, RESERVED_ID, VOX_MAGIC};
use crate::core::{encode_dict, ByteWriter, Dict};
use crate::model::{LegacyMaterial, Material, Model, Palette, VoxelDocument};
use crate::scene::{SceneGraph, SceneNode};
use crate::util::Result;

/// Encode a document with default settings.
pub fn encode(doc: &VoxelDocument) -> Result<Vec<u8>> {
    encode_with(doc, &WriteOptions::default())
}

/// Encode a document. The document is validated first.
#[tracing::instrument(skip_all, fields(models = doc.models.len()))]
pub fn encode_with(doc: &VoxelDocument, options: &WriteOptions) -> Result<Vec<u8>> {
    doc.validate()?;

    let mut main = ChunkBuilder::new(ChunkTag::MAIN);

    if options.pack.emits(doc.models.len()) {
        main.push_child(
            ChunkBuilder::new(ChunkTag::PACK).with_content(|w| w.write_len(doc.models.len())),
        );
    }
    for model in &doc.models {
        push_model(&mut main, model);
    }

    main.push_child(rgba_chunk(&doc.palette));
    if let Some(map) = &doc.index_map {
        main.push_child(ChunkBuilder::new(ChunkTag::IMAP).with_content(|w| w.write_bytes(&map.0)));
    }

    for (&id, material) in &doc.materials {
        main.push_child(material_chunk(id, material, options.materials));
    }

    if let Some(scene) = &doc.scene {
        push_scene(&mut main, scene);
    }

    for layer in &doc.layers {
        main.push_child(ChunkBuilder::new(ChunkTag::LAYR).with_content(|w| {
            w.write_u32(layer.id);
            encode_dict(&layer.attributes, w);
            w.write_u32(RESERVED_ID);
        }));
    }
    for obj in &doc.render_objects {
        main.push_child(dict_chunk(ChunkTag::ROBJ, &obj.attributes));
    }
    for camera in &doc.cameras {
        main.push_child(ChunkBuilder::new(ChunkTag::RCAM).with_content(|w| {
            w.write_u32(camera.id);
            encode_dict(&camera.attributes, w);
        }));
    }
    for note in &doc.notes {
        main.push_child(dict_chunk(ChunkTag::NOTE, &note.attributes));
    }

    tracing::debug!(chunks = main.child_count(), bytes = main.encoded_len(), "encoded MAIN");

    let mut out = ByteWriter::with_capacity(8 + main.encoded_len());
    out.write_bytes(VOX_MAGIC);
    out.write_u32(doc.version);
    main.finish_into(&mut out);
    Ok(out.into_inner())
}

fn push_model(main: &mut ChunkBuilder, model: &Model) {
    main.push_child(ChunkBuilder::new(ChunkTag::SIZE).with_content(|w| {
        w.write_u32(model.size.x);
        w.write_u32(model.size.y);
        w.write_u32(model.size.z);
    }));
    main.push_child(ChunkBuilder::new(ChunkTag::XYZI).with_content(|w| {
        w.write_len(model.voxels.len());
        for v in &model.voxels {
            w.write_bytes(&[v.x, v.y, v.z, v.i]);
        }
    }));
}

fn rgba_chunk(palette: &Palette) -> ChunkBuilder {
    let slots = palette.to_wire_slots();
    ChunkBuilder::new(ChunkTag::RGBA).with_content(|w| w.write_bytes(bytemuck::cast_slice(&slots[..])))
}

fn dict_chunk(tag: ChunkTag, dict: &Dict) -> ChunkBuilder {
    ChunkBuilder::new(tag).with_content(|w| encode_dict(dict, w))
}

fn material_chunk(id: u8, material: &Material, policy: MaterialPolicy) -> ChunkBuilder {
    match (material, policy) {
        (Material::Legacy(m), MaterialPolicy::Preserve) => matt_chunk(id, m),
        (material, _) => {
            let props = material.to_modern();
            ChunkBuilder::new(ChunkTag::MATL).with_content(|w| {
                w.write_u32(id as u32);
                encode_dict(&props, w);
            })
        }
    }
}

fn matt_chunk(id: u8, m: &LegacyMaterial) -> ChunkBuilder {
    ChunkBuilder::new(ChunkTag::MATT).with_content(|w| {
        w.write_u32(id as u32);
        w.write_u32(m.kind as u32);
        w.write_f32(m.weight);
        w.write_u32(m.property_bits());
        // BTreeMap iteration is bit order.
        for value in m.properties.values() {
            w.write_f32(*value);
        }
    })
}

/// Nodes go out in arena order; the root stays the first transform record.
fn push_scene(main: &mut ChunkBuilder, scene: &SceneGraph) {
    for node in scene.nodes() {
        main.push_child(node_chunk(node));
    }
}

fn node_chunk(node: &SceneNode) -> ChunkBuilder {
    match node {
        SceneNode::Transform(t) => ChunkBuilder::new(ChunkTag::NTRN).with_content(|w| {
            w.write_u32(t.id);
            encode_dict(&t.attributes, w);
            w.write_u32(t.child_id);
            w.write_u32(RESERVED_ID);
            w.write_u32(t.layer_id);
            w.write_len(t.frames.len());
            for frame in &t.frames {
                encode_dict(&frame.to_dict(), w);
            }
        }),
        SceneNode::Group(g) => ChunkBuilder::new(ChunkTag::NGRP).with_content(|w| {
            w.write_u32(g.id);
            encode_dict(&g.attributes, w);
            w.write_len(g.children.len());
            for child in &g.children {
                w.write_u32(*child);
            }
        }),
        SceneNode::Shape(s) => ChunkBuilder::new(ChunkTag::NSHP).with_content(|w| {
            w.write_u32(s.id);
            encode_dict(&s.attributes, w);
            w.write_u32(1);
            w.write_u32(s.model_id);
            encode_dict(&s.model_attributes, w);
        }),
    }
}
