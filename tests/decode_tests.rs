//! Integration tests for decoding hand-built .vox byte streams.

use voxfile::chunk::{write_chunk, ChunkBuilder, ChunkTag, CURRENT_VERSION, RESERVED_ID};
use voxfile::core::{encode_dict, ByteWriter, Dict, Rotation};
use voxfile::util::IVec3;
use voxfile::model::{Rgba, Size, Voxel};
use voxfile::scene::SceneNode;
use voxfile::vox::{decode, decode_with, DecodeWarning, ReadOptions};
use voxfile::Error;

// ============================================================================
// Fixture builders
// ============================================================================

fn vox_file(children: &[Vec<u8>]) -> Vec<u8> {
    let mut main = ChunkBuilder::new(ChunkTag::MAIN);
    for child in children {
        main.push_raw_child(child);
    }
    let mut out = ByteWriter::new();
    out.write_bytes(b"VOX ");
    out.write_u32(CURRENT_VERSION);
    main.finish_into(&mut out);
    out.into_inner()
}

fn words(tag: ChunkTag, values: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    for v in values {
        w.write_u32(*v);
    }
    write_chunk(tag, w.as_bytes(), &[])
}

fn size(x: u32, y: u32, z: u32) -> Vec<u8> {
    words(ChunkTag::SIZE, &[x, y, z])
}

fn xyzi(voxels: &[[u8; 4]]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_len(voxels.len());
    for v in voxels {
        w.write_bytes(v);
    }
    write_chunk(ChunkTag::XYZI, w.as_bytes(), &[])
}

fn ntrn(id: u32, child: u32, frame: Dict) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u32(id);
    encode_dict(&Dict::new(), &mut w);
    w.write_u32(child);
    w.write_u32(RESERVED_ID);
    w.write_u32(RESERVED_ID);
    w.write_u32(1);
    encode_dict(&frame, &mut w);
    write_chunk(ChunkTag::NTRN, w.as_bytes(), &[])
}

fn ngrp(id: u32, children: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u32(id);
    encode_dict(&Dict::new(), &mut w);
    w.write_len(children.len());
    for c in children {
        w.write_u32(*c);
    }
    write_chunk(ChunkTag::NGRP, w.as_bytes(), &[])
}

fn nshp(id: u32, models: &[u32]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u32(id);
    encode_dict(&Dict::new(), &mut w);
    w.write_len(models.len());
    for m in models {
        w.write_u32(*m);
        encode_dict(&Dict::new(), &mut w);
    }
    write_chunk(ChunkTag::NSHP, w.as_bytes(), &[])
}

fn cube() -> Vec<Vec<u8>> {
    vec![size(1, 1, 1), xyzi(&[[0, 0, 0, 1]])]
}

fn with_cube(rest: Vec<Vec<u8>>) -> Vec<u8> {
    let mut children = cube();
    children.extend(rest);
    vox_file(&children)
}

// ============================================================================
// Models and palette
// ============================================================================

#[test]
fn test_minimal_document() {
    let report = decode_with(&vox_file(&cube()), &ReadOptions::default()).expect("decode");
    assert!(report.is_clean(), "warnings: {:?}", report.warnings);

    let doc = report.document;
    assert_eq!(doc.version, CURRENT_VERSION);
    assert_eq!(doc.models.len(), 1);
    assert_eq!(doc.models[0].size, Size::new(1, 1, 1));
    assert_eq!(doc.models[0].voxels, vec![Voxel::new(0, 0, 0, 1)]);
    assert!(doc.scene.is_none());
    assert!(doc.palette.is_legacy_default());
}

#[test]
fn test_models_pair_positionally() {
    let data = vox_file(&[
        words(ChunkTag::PACK, &[2]),
        size(2, 1, 1),
        xyzi(&[[1, 0, 0, 7]]),
        size(1, 3, 1),
        xyzi(&[[0, 2, 0, 9], [0, 0, 0, 9]]),
    ]);
    let doc = decode(&data).expect("decode");
    assert_eq!(doc.models.len(), 2);
    assert_eq!(doc.models[0].size, Size::new(2, 1, 1));
    assert_eq!(doc.models[1].voxel_count(), 2);
    assert_eq!(doc.models[1].voxels[0], Voxel::new(0, 2, 0, 9));
}

#[test]
fn test_palette_remap() {
    let mut content = vec![0u8; 1024];
    content[..4].copy_from_slice(&[255, 0, 0, 255]);
    content[1020..].copy_from_slice(&[1, 2, 3, 4]);
    let doc = decode(&with_cube(vec![write_chunk(ChunkTag::RGBA, &content, &[])])).expect("decode");

    assert_eq!(doc.palette.get(1), Rgba::new(255, 0, 0, 255));
    assert_eq!(doc.palette.get(0), Rgba::TRANSPARENT);
    // Slot 255 has no palette entry to land in.
    assert!(doc.palette.colors().iter().all(|c| *c != Rgba::new(1, 2, 3, 4)));
}

#[test]
fn test_short_rgba_is_truncated() {
    let data = with_cube(vec![write_chunk(ChunkTag::RGBA, &[0u8; 1000], &[])]);
    let err = decode(&data).unwrap_err();
    assert_eq!(err.chunk_tag(), Some(ChunkTag::RGBA));
    assert!(matches!(err.root_cause(), Error::TruncatedInput { needed: 1024, available: 1000, .. }));
}

// ============================================================================
// Header and framing
// ============================================================================

#[test]
fn test_bad_magic() {
    let mut data = vox_file(&cube());
    data[..4].copy_from_slice(b"RIFF");
    assert!(matches!(decode(&data), Err(Error::MalformedHeader(_))));
}

#[test]
fn test_main_children_size_too_small() {
    let inner = cube().concat();
    let mut w = ByteWriter::new();
    w.write_bytes(b"VOX ");
    w.write_u32(CURRENT_VERSION);
    w.write_u32(ChunkTag::MAIN.0);
    w.write_u32(0);
    // Cuts the SIZE chunk short.
    w.write_u32(20);
    w.write_bytes(&inner);

    let err = decode(w.as_bytes()).unwrap_err();
    assert!(
        matches!(err, Error::ChunkSizeMismatch { tag: ChunkTag::MAIN, offset: 20, .. }),
        "got {err:?}"
    );
}

#[test]
fn test_nested_children_size_mismatch() {
    let mut w = ByteWriter::new();
    w.write_u32(1);
    w.write_u32(1);
    w.write_u32(1);
    // Four bytes cannot hold a nested chunk header.
    let bad_size = write_chunk(ChunkTag::SIZE, w.as_bytes(), &[0, 0, 0, 0]);
    let data = vox_file(&[bad_size, xyzi(&[[0, 0, 0, 1]])]);
    assert!(matches!(
        decode(&data),
        Err(Error::ChunkSizeMismatch { tag: ChunkTag::SIZE, .. })
    ));
}

#[test]
fn test_truncated_file() {
    let data = vox_file(&cube());
    let err = decode(&data[..data.len() - 3]).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { offset: 8, .. }), "got {err:?}");
}

#[test]
fn test_dict_length_overrun() {
    let mut w = ByteWriter::new();
    w.write_u32(1);
    w.write_u32(4);
    w.write_bytes(b"_a");
    let note = write_chunk(ChunkTag::NOTE, w.as_bytes(), &[]);
    let err = decode(&with_cube(vec![note])).unwrap_err();
    assert_eq!(err.chunk_tag(), Some(ChunkTag::NOTE));
    assert!(matches!(err.root_cause(), Error::InvalidDictEncoding { .. }), "got {err:?}");
}

// ============================================================================
// Model section ordering and counts
// ============================================================================

#[test]
fn test_unpaired_size_chunk() {
    let data = vox_file(&[
        size(1, 1, 1),
        write_chunk(ChunkTag::RGBA, &[0u8; 1024], &[]),
        xyzi(&[[0, 0, 0, 1]]),
    ]);
    assert!(matches!(
        decode(&data),
        Err(Error::UnpairedSizeChunk { offset: 20, found: Some(ChunkTag::RGBA) })
    ));
}

#[test]
fn test_pack_count_mismatch_warns() {
    let mut children = vec![words(ChunkTag::PACK, &[2])];
    children.extend(cube());
    let data = vox_file(&children);

    let report = decode_with(&data, &ReadOptions::default()).expect("decode");
    assert_eq!(
        report.warnings,
        vec![DecodeWarning::ModelCountMismatch { expected: 2, actual: 1 }]
    );
    assert_eq!(report.document.models.len(), 1);

    let err = decode_with(&data, &ReadOptions::strict()).unwrap_err();
    assert!(matches!(err, Error::ModelCountMismatch { expected: 2, actual: 1 }));
}

#[test]
fn test_unknown_chunk_skipped() {
    let unknown_tag = ChunkTag::from_bytes(*b"XTRA");
    let child = write_chunk(ChunkTag::from_bytes(*b"XCHD"), &[9, 9], &[]);
    let unknown = write_chunk(unknown_tag, &[1, 2, 3, 4, 5], &child);
    let note = {
        let mut w = ByteWriter::new();
        encode_dict(&Dict::new().with("_text", "after"), &mut w);
        write_chunk(ChunkTag::NOTE, w.as_bytes(), &[])
    };

    let report =
        decode_with(&with_cube(vec![unknown, note]), &ReadOptions::default()).expect("decode");
    assert!(matches!(
        report.warnings.as_slice(),
        [DecodeWarning::UnknownChunk { tag, offset: 64 }] if *tag == unknown_tag
    ));
    assert_eq!(report.document.notes.len(), 1);
    assert_eq!(report.document.notes[0].attributes.get("_text"), Some("after"));
}

// ============================================================================
// Scene graph
// ============================================================================

#[test]
fn test_scene_graph_decodes() {
    let frame = Dict::new().with("_r", "105").with("_t", "1 2 3");
    let data = with_cube(vec![
        ntrn(0, 1, Dict::new()),
        ngrp(1, &[2]),
        ntrn(2, 3, frame),
        nshp(3, &[0]),
    ]);
    let doc = decode(&data).expect("decode");
    let scene = doc.scene.as_ref().expect("scene graph");
    assert_eq!(scene.root(), 0);
    assert_eq!(scene.len(), 4);

    let Some(SceneNode::Transform(t)) = scene.get(2) else {
        panic!("node 2 should be a transform");
    };
    let frame = t.first_frame().expect("frame");
    assert_eq!(frame.translation, Some(IVec3::new(1, 2, 3)));
    assert_eq!(
        frame.rotation.map(|r| r.matrix()),
        Some([[0, 1, 0], [0, 0, -1], [-1, 0, 0]])
    );

    let instances = doc.instances().expect("instances");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].model_id, 0);
    assert_eq!(instances[0].transform.translation, IVec3::new(1, 2, 3));
}

#[test]
fn test_group_forward_reference_resolves() {
    // Group listed before the nodes it points at.
    let data = with_cube(vec![
        ngrp(5, &[6]),
        ntrn(4, 5, Dict::new()),
        ntrn(6, 7, Dict::new()),
        nshp(7, &[0]),
    ]);
    let doc = decode(&data).expect("decode");
    assert_eq!(doc.scene.as_ref().map(|s| s.root()), Some(4));
}

#[test]
fn test_nested_translation_overflow() {
    let data = with_cube(vec![
        ntrn(0, 1, Dict::new().with("_t", "1 0 0")),
        ntrn(1, 2, Dict::new().with("_t", "2147483647 0 0")),
        nshp(2, &[0]),
    ]);
    // Each translation fits in i32 on its own, so the file decodes.
    let doc = decode(&data).expect("decode");
    assert!(matches!(doc.instances(), Err(Error::TransformOverflow { node_id: 1 })));
    assert!(matches!(doc.visible_instances(), Err(Error::TransformOverflow { .. })));
}

#[test]
fn test_group_chain_with_repeated_children_rejected() {
    let depth = 22u32;
    let mut chunks = vec![ntrn(0, 1, Dict::new())];
    for id in 1..=depth {
        chunks.push(ngrp(id, &[id + 1, id + 1]));
    }
    chunks.push(nshp(depth + 1, &[0]));
    let err = decode(&with_cube(chunks)).unwrap_err();
    assert!(
        matches!(err, Error::SharedSceneNode { node_id: 2, first_parent: 1, second_parent: 1 }),
        "got {err:?}"
    );
}

#[test]
fn test_shape_with_two_parents_rejected() {
    let data = with_cube(vec![
        ntrn(0, 1, Dict::new()),
        ngrp(1, &[2, 3]),
        ntrn(2, 4, Dict::new()),
        ntrn(3, 4, Dict::new()),
        nshp(4, &[0]),
    ]);
    assert!(matches!(
        decode(&data),
        Err(Error::SharedSceneNode { node_id: 4, first_parent: 2, second_parent: 3 })
    ));
}

#[test]
fn test_dangling_group_child() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new()), ngrp(1, &[42])]);
    assert!(matches!(
        decode(&data),
        Err(Error::DanglingNodeReference { node_id: 1, child_id: 42 })
    ));
}

#[test]
fn test_shape_with_two_models() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new()), nshp(1, &[0, 0])]);
    assert!(matches!(
        decode(&data),
        Err(Error::InvalidShapeModelCount { node_id: 1, count: 2 })
    ));
}

#[test]
fn test_shape_references_missing_model() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new()), nshp(1, &[1])]);
    assert!(matches!(
        decode(&data),
        Err(Error::InvalidModelReference { model_id: 1, model_count: 1, .. })
    ));
}

#[test]
fn test_transform_group_transform_cycle() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new()), ngrp(1, &[2]), ntrn(2, 0, Dict::new())]);
    assert!(matches!(decode(&data), Err(Error::CyclicSceneGraph { .. })));
}

#[test]
fn test_duplicate_node_id() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new()), nshp(1, &[0]), nshp(1, &[0])]);
    assert!(matches!(decode(&data), Err(Error::DuplicateNodeId { node_id: 1 })));
}

#[test]
fn test_invalid_rotation_byte_in_frame() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new().with("_r", "5")), nshp(1, &[0])]);
    assert!(matches!(
        decode(&data),
        Err(Error::InvalidRotationByte { byte: 5, node_id: Some(0) })
    ));
}

#[test]
fn test_identity_rotation_string() {
    let data = with_cube(vec![ntrn(0, 1, Dict::new().with("_r", "4")), nshp(1, &[0])]);
    let doc = decode(&data).expect("decode");
    let instances = doc.instances().expect("instances");
    assert_eq!(instances[0].transform.rotation, Rotation::IDENTITY);
}
