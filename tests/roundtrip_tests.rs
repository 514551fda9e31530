//! Integration tests for encoding documents and verifying round-trip.

use std::collections::BTreeMap;

use voxfile::core::{Dict, Rotation};
use voxfile::io;
use voxfile::model::{
    Camera, IndexMap, Layer, LegacyMaterial, LegacyProperty, Material, MaterialKind, Model, Note,
    RenderObject, Rgba, Size, Voxel, VoxelDocument,
};
use voxfile::scene::{Frame, SceneGraph, SceneNode};
use voxfile::util::IVec3;
use voxfile::vox::{decode, decode_with, encode, encode_with, MaterialPolicy, PackPolicy, ReadOptions, WriteOptions};

use tempfile::NamedTempFile;

fn sample_document() -> VoxelDocument {
    let models = vec![
        Model::with_voxels(
            Size::new(3, 3, 3),
            vec![Voxel::new(0, 0, 0, 1), Voxel::new(2, 1, 0, 17), Voxel::new(1, 2, 2, 255)],
        ),
        Model::with_voxels(Size::new(1, 2, 1), vec![Voxel::new(0, 1, 0, 3)]),
    ];
    let mut doc = VoxelDocument::with_models(models);

    doc.palette.set(1, Rgba::new(255, 0, 0, 255)).expect("set");
    doc.palette.set(255, Rgba::new(9, 8, 7, 6)).expect("set");

    let mut materials = BTreeMap::new();
    materials.insert(
        1,
        Material::Legacy(
            LegacyMaterial::new(MaterialKind::Glass, 0.75)
                .with(LegacyProperty::Roughness, 0.1)
                .with(LegacyProperty::Ior, 0.3)
                .with(LegacyProperty::Glow, 0.5),
        ),
    );
    materials.insert(
        17,
        Material::Modern(Dict::new().with("_type", "_metal").with("_rough", "0.2").with("_custom", "x")),
    );
    doc.materials = materials;

    let mut layer = Layer::new(0);
    layer.attributes.insert("_name", "main");
    doc.layers.push(layer);
    let mut hidden = Layer::new(1);
    hidden.attributes.set_bool("_hidden", true);
    doc.layers.push(hidden);

    let mut camera = Camera::new(0);
    camera.attributes.insert("_mode", "pers");
    camera.attributes.insert("_fov", "45");
    doc.cameras.push(camera);

    doc.render_objects.push(RenderObject {
        attributes: Dict::new().with("_type", "_bg").with("_color", "0 0 0"),
    });
    doc.notes.push(Note { attributes: Dict::new().with("_text", "hello") });
    doc.index_map = Some(IndexMap((0..=255u8).rev().collect()));
    doc
}

#[test]
fn test_roundtrip_in_memory() {
    let doc = sample_document();
    let bytes = encode(&doc).expect("encode");

    let report = decode_with(&bytes, &ReadOptions::strict()).expect("decode");
    assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    assert_eq!(report.document, doc);
}

#[test]
fn test_roundtrip_is_stable() {
    let doc = sample_document();
    let first = encode(&doc).expect("encode");
    let second = encode(&decode(&first).expect("decode")).expect("re-encode");
    assert_eq!(first, second);
}

#[test]
fn test_roundtrip_transformed_scene() {
    let mut doc = sample_document();
    let scene = doc.scene.take().expect("scene");

    // Rotate and move the second model's transform, put it on the hidden layer.
    let mut nodes: Vec<SceneNode> = scene.nodes().to_vec();
    for node in &mut nodes {
        if let SceneNode::Transform(t) = node {
            if t.id == 4 {
                t.layer_id = 1;
                t.frames = vec![Frame {
                    rotation: Some(Rotation::from_byte(0x69).expect("rotation")),
                    translation: Some(IVec3::new(-4, 0, 12)),
                    attributes: Dict::new().with("_f", "0"),
                }];
                t.attributes.insert("_name", "moved");
            }
        }
    }
    let rebuilt = voxfile::scene::build_scene_graph(
        nodes.into_iter().map(Into::into).collect(),
        doc.models.len(),
    )
    .expect("rebuild");
    doc.scene = Some(rebuilt);

    let decoded = decode(&encode(&doc).expect("encode")).expect("decode");
    assert_eq!(decoded, doc);

    let instances = decoded.instances().expect("instances");
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[1].transform.translation, IVec3::new(-4, 0, 12));
    assert_eq!(instances[1].transform.rotation.to_byte(), 0x69);
    assert_eq!(instances[1].layer_id, Some(1));

    let visible = decoded.visible_instances().expect("visible");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].model_id, 0);
}

#[test]
fn test_pack_policies() {
    let single = VoxelDocument::with_models(vec![Model::with_voxels(
        Size::new(1, 1, 1),
        vec![Voxel::new(0, 0, 0, 1)],
    )]);
    for pack in [PackPolicy::Always, PackPolicy::WhenMultiple, PackPolicy::Never] {
        let bytes = encode_with(&single, &WriteOptions::new().pack(pack)).expect("encode");
        let report = decode_with(&bytes, &ReadOptions::strict()).expect("decode");
        assert_eq!(report.document, single, "{:?}", pack);
    }

    // Without PACK two models read back as a count mismatch.
    let doc = sample_document();
    let bytes = encode_with(&doc, &WriteOptions::new().pack(PackPolicy::Never)).expect("encode");
    let report = decode_with(&bytes, &ReadOptions::default()).expect("decode");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.document.models, doc.models);
}

#[test]
fn test_modern_material_policy() {
    let doc = sample_document();
    let opts = WriteOptions::new().materials(MaterialPolicy::Modern);
    let decoded = decode(&encode_with(&doc, &opts).expect("encode")).expect("decode");

    assert!(decoded.materials.values().all(|m| !m.is_legacy()));
    let Some(Material::Modern(props)) = decoded.material(1) else {
        panic!("material 1 should be modern");
    };
    assert_eq!(props.get("_type"), Some("_glass"));
    assert_eq!(props.get("_weight"), Some("0.75"));
    assert_eq!(props.get("_ior"), Some("0.3"));
    assert_eq!(props.get("_glow"), Some("0.5"));
    assert_eq!(decoded.material(17), doc.material(17));
}

#[test]
fn test_document_without_scene() {
    let mut doc = VoxelDocument::new();
    doc.models.push(Model::with_voxels(Size::new(2, 2, 2), vec![Voxel::new(1, 1, 1, 5)]));
    let decoded = decode(&encode(&doc).expect("encode")).expect("decode");
    assert!(decoded.scene.is_none());
    assert_eq!(decoded, doc);
}

#[test]
fn test_invalid_document_rejected() {
    let mut doc = sample_document();
    doc.models[1].voxels.push(Voxel::new(5, 0, 0, 1));
    assert!(matches!(encode(&doc), Err(voxfile::Error::InvalidVoxel { model: 1, .. })));

    let mut doc = sample_document();
    doc.scene = Some(SceneGraph::for_models(5));
    assert!(matches!(
        encode(&doc),
        Err(voxfile::Error::InvalidModelReference { .. })
    ));
}

#[test]
fn test_roundtrip_file() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();
    let doc = sample_document();

    io::save(path, &doc).expect("save");
    let read = io::open(path).expect("open");
    assert_eq!(read, doc);

    let report = io::open_with(path, &ReadOptions::strict()).expect("open strict");
    assert!(report.is_clean());
}

#[test]
fn test_copy_file_with_options() {
    let src = NamedTempFile::new().expect("temp");
    let dst = NamedTempFile::new().expect("temp");
    io::save(src.path(), &sample_document()).expect("save");

    let doc = io::open(src.path()).expect("open");
    let opts = WriteOptions::new().pack(PackPolicy::WhenMultiple).materials(MaterialPolicy::Modern);
    io::save_with(dst.path(), &doc, &opts).expect("save copy");

    let copy = io::open(dst.path()).expect("open copy");
    assert_eq!(copy.models, doc.models);
    assert_eq!(copy.scene, doc.scene);
    assert_eq!(copy.palette, doc.palette);
    assert_eq!(copy.materials.len(), doc.materials.len());
}
