use ecson_core::{Transform, Vec3};
use ecson_doc::{
    validate_document, Asset, AssetType, Component, DocumentBuilder, EntityBuilder, SceneDocument,
    DOCUMENT_TARGET,
};
use ecson_ops::{apply, apply_many, op_from_json, Migrations, OpError, OpKind, PatchOp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

fn fixture() -> SceneDocument {
    DocumentBuilder::new("Fixture")
        .ids("doc", "root")
        .asset(Asset::new("mesh-a", AssetType::Mesh, "Box").with_uri("box.glb"))
        .asset(Asset::new("mesh-b", AssetType::Mesh, "Sphere"))
        .entity(
            EntityBuilder::new("parentA", "Parent A")
                .parent("root")
                .position(1.0, 0.0, 0.0)
                .component(Component::new("MeshRenderer").with_property("meshAssetId", json!("mesh-a"))),
        )
        .entity(EntityBuilder::new("childOfA", "Child").parent("parentA"))
        .entity(EntityBuilder::new("grandchildOfA", "Grandchild").parent("childOfA"))
        .entity(
            EntityBuilder::new("dancer", "Dancer")
                .parent("root")
                .tag("npc")
                .component(Component::new("Animation").with_property(
                    "tracks",
                    json!({ "walk": { "keyframes": [
                        { "time": 0.0, "value": 0 },
                        { "time": 1.0, "value": 10 }
                    ] } }),
                )),
        )
        .entity(
            EntityBuilder::new("lamp", "Lamp")
                .parent("root")
                .component(Component::new("MeshRenderer"))
                .component(Component::new("Light").with_property("intensity", json!(2.0))),
        )
        .build()
}

/// apply, undo, and check the document is back where it started.
fn assert_inverse_identity(kind: OpKind) {
    let mut doc = fixture();
    let before = doc.clone();
    let op = PatchOp::new(kind);
    let inverse = apply(&mut doc, &op).unwrap_or_else(|e| panic!("{} failed: {e}", op.op_type()));
    assert_ne!(doc, before, "{} did not change the document", op.op_type());
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before, "{} inverse did not restore", op.op_type());
}

#[test]
fn test_inverse_identity_for_every_op_type() {
    let cases = vec![
        OpKind::create_entity("e1", "Cube", "root"),
        OpKind::delete_entity("grandchildOfA"),
        OpKind::set_property("parentA", "transform.position", json!({ "x": 1, "y": 2, "z": 3 })),
        OpKind::AddChild {
            parent_id: "root".into(),
            child_id: "e9".into(),
            index: None,
        },
        OpKind::RemoveChild {
            parent_id: "root".into(),
            child_id: "lamp".into(),
        },
        OpKind::reparent("grandchildOfA", "lamp"),
        OpKind::add_component("parentA", Component::new("Collider")),
        OpKind::remove_component("lamp", "Light"),
        OpKind::set_component_property("lamp", "Light", "color", json!("#ff0000")),
        OpKind::AddAsset {
            asset: Asset::new("tex", AssetType::Texture, "Grass"),
        },
        OpKind::RemoveAsset {
            asset_id: "mesh-b".into(),
            previous_asset: None,
        },
        OpKind::ReplaceAssetRef {
            entity_id: "parentA".into(),
            component_type: "MeshRenderer".into(),
            property_path: "meshAssetId".into(),
            old_asset_id: "mesh-a".into(),
            new_asset_id: "mesh-b".into(),
        },
        OpKind::AddKeyframe {
            entity_id: "dancer".into(),
            track_name: "walk".into(),
            keyframe: json!({ "time": 0.5, "value": 5, "interpolation": "step" }),
            index: None,
        },
        OpKind::RemoveKeyframe {
            entity_id: "dancer".into(),
            track_name: "walk".into(),
            time: 0.0,
            previous_keyframe: None,
        },
        OpKind::SetKeyframeValue {
            entity_id: "dancer".into(),
            track_name: "walk".into(),
            time: 1.0,
            value: json!(20),
            previous_value: None,
        },
        OpKind::BatchOp {
            ops: vec![
                PatchOp::new(OpKind::create_entity("b1", "B1", "root")),
                PatchOp::new(OpKind::create_entity("b2", "B2", "b1")),
                PatchOp::new(OpKind::reparent("lamp", "b2")),
            ],
        },
    ];
    let covered: std::collections::BTreeSet<_> = cases.iter().map(OpKind::type_name).collect();
    assert_eq!(covered.len(), OpKind::TYPE_NAMES.len());

    for kind in cases {
        if let OpKind::AddChild { .. } = kind {
            // AddChild needs a detached entity to attach.
            let mut doc = fixture();
            apply(
                &mut doc,
                &PatchOp::new(OpKind::CreateEntity {
                    entity_id: "e9".into(),
                    name: "Loose".into(),
                    parent_id: None,
                    index: None,
                    transform: None,
                    tags: Default::default(),
                    visible: None,
                    locked: None,
                    tuning: None,
                }),
            )
            .unwrap();
            let before = doc.clone();
            let inverse = apply(&mut doc, &PatchOp::new(kind)).unwrap();
            apply(&mut doc, &inverse).unwrap();
            assert_eq!(doc, before);
            continue;
        }
        assert_inverse_identity(kind);
    }
}

#[test]
fn test_replace_asset_ref_needs_resolvable_current_reference() {
    let mut doc = fixture();
    apply(
        &mut doc,
        &PatchOp::new(OpKind::set_component_property(
            "lamp",
            "MeshRenderer",
            "meshAssetId",
            json!("imported-but-unregistered"),
        )),
    )
    .unwrap();
    let before = doc.clone();
    let replace = PatchOp::new(OpKind::ReplaceAssetRef {
        entity_id: "lamp".into(),
        component_type: "MeshRenderer".into(),
        property_path: "meshAssetId".into(),
        old_asset_id: "imported-but-unregistered".into(),
        new_asset_id: "mesh-b".into(),
    });
    let err = apply(&mut doc, &replace).unwrap_err();
    assert!(matches!(err, OpError::AssetNotFound(_)));
    assert_eq!(doc, before);

    // Once the reference resolves, apply then undo is exact.
    apply(
        &mut doc,
        &PatchOp::new(OpKind::AddAsset {
            asset: Asset::new("imported-but-unregistered", AssetType::Mesh, "Imported"),
        }),
    )
    .unwrap();
    let before = doc.clone();
    let inverse = apply(&mut doc, &replace).unwrap();
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_scenario_create_then_inverse() {
    let mut doc = fixture();
    let before = doc.clone();
    let inverse = apply(
        &mut doc,
        &PatchOp::new(OpKind::create_entity("e1", "Cube", "root")),
    )
    .unwrap();
    match &inverse.kind {
        OpKind::DeleteEntity {
            entity_id,
            previous_state,
        } => {
            assert_eq!(entity_id, "e1");
            assert_eq!(previous_state.as_ref().map(|e| e.name.as_str()), Some("Cube"));
        }
        other => panic!("expected DeleteEntity, got {other:?}"),
    }
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_scenario_circular_reparent_rejected() {
    let mut doc = fixture();
    let before = doc.clone();
    let err = apply(
        &mut doc,
        &PatchOp::new(OpKind::reparent("parentA", "grandchildOfA")),
    )
    .unwrap_err();
    assert!(matches!(err, OpError::CircularReparent { .. }));
    assert_eq!(
        err.to_string(),
        "circular reparent: parentA is an ancestor of grandchildOfA"
    );
    assert_eq!(doc, before);
}

#[test]
fn test_scenario_delete_with_components_inverts_to_batch() {
    let mut doc = fixture();
    let before = doc.clone();
    let inverse = apply(&mut doc, &PatchOp::new(OpKind::delete_entity("lamp"))).unwrap();
    let ops = match &inverse.kind {
        OpKind::BatchOp { ops } => ops,
        other => panic!("expected BatchOp, got {other:?}"),
    };
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].op_type(), "CreateEntity");
    let types: Vec<&str> = ops[1..]
        .iter()
        .map(|op| match &op.kind {
            OpKind::AddComponent { component, .. } => component.component_type.as_str(),
            other => panic!("expected AddComponent, got {other:?}"),
        })
        .collect();
    assert_eq!(types, vec!["MeshRenderer", "Light"]);
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_set_property_inverse_uses_actual_prior_value() {
    let mut doc = fixture();
    let op = PatchOp::new(OpKind::SetProperty {
        entity_id: "parentA".into(),
        path: "name".into(),
        value: Some(json!("Renamed")),
        previous_value: Some(json!("a lie")),
    });
    let inverse = apply(&mut doc, &op).unwrap();
    match inverse.kind {
        OpKind::SetProperty { value, .. } => assert_eq!(value, Some(json!("Parent A"))),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_environment_via_document_target() {
    let mut doc = fixture();
    let before = doc.clone();
    let inverse = apply(
        &mut doc,
        &PatchOp::new(OpKind::set_property(
            DOCUMENT_TARGET,
            "environment.gravity",
            json!({ "x": 0.0, "y": -1.62, "z": 0.0 }),
        )),
    )
    .unwrap();
    assert_eq!(doc.environment.gravity, Vec3::new(0.0, -1.62, 0.0));
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_nested_batch_inverse_restores() {
    let mut doc = fixture();
    let before = doc.clone();
    let batch = PatchOp::batch(vec![
        PatchOp::new(OpKind::create_entity("x", "X", "root")),
        PatchOp::batch(vec![
            PatchOp::new(OpKind::add_component("x", Component::new("Collider"))),
            PatchOp::new(OpKind::set_component_property("x", "Collider", "size", json!(2))),
        ]),
        PatchOp::new(OpKind::delete_entity("grandchildOfA")),
    ]);
    let inverse = apply(&mut doc, &batch).unwrap();
    apply(&mut doc, &inverse).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_batch_failure_leaves_document_unchanged() {
    let mut doc = fixture();
    let before = doc.clone();
    let batch = PatchOp::batch(vec![
        PatchOp::new(OpKind::create_entity("x", "X", "root")),
        PatchOp::new(OpKind::delete_entity("grandchildOfA")),
        PatchOp::new(OpKind::reparent("parentA", "childOfA")),
    ]);
    let err = apply(&mut doc, &batch).unwrap_err();
    assert!(matches!(err, OpError::BatchFailed { index: 2, .. }));
    assert_eq!(doc, before);

    let err = apply_many(&mut doc, batch_ops(&batch)).unwrap_err();
    assert!(matches!(err.root_cause(), OpError::CircularReparent { .. }));
    assert_eq!(doc, before);
}

fn batch_ops(op: &PatchOp) -> &[PatchOp] {
    match &op.kind {
        OpKind::BatchOp { ops } => ops,
        _ => std::slice::from_ref(op),
    }
}

#[test]
fn test_wire_roundtrip_then_apply() {
    let op = PatchOp::new(OpKind::set_property(
        "parentA",
        "transform",
        serde_json::to_value(Transform::identity().with_scale(2.0, 2.0, 2.0)).unwrap(),
    ));
    let decoded = op_from_json(&op.to_json().unwrap(), &Migrations::builtin()).unwrap();
    assert_eq!(decoded, op);

    let mut a = fixture();
    let mut b = fixture();
    apply(&mut a, &op).unwrap();
    apply(&mut b, &decoded).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_migrated_op_applies() {
    let migrations = Migrations::new().with("SetProperty", 0, |mut payload| {
        let object = payload.as_object_mut().ok_or("not an object")?;
        if let Some(target) = object.remove("target") {
            object.insert("entityId".into(), target);
        }
        Ok(payload)
    });
    let legacy = r#"{
        "id": "legacy-1", "timestamp": 1, "origin": "replay", "version": 0,
        "type": "SetProperty",
        "payload": { "target": "lamp", "path": "visible", "value": false }
    }"#;
    let op = op_from_json(legacy, &migrations).unwrap();
    let mut doc = fixture();
    apply(&mut doc, &op).unwrap();
    assert!(!doc.entity("lamp").unwrap().visible);
}

// --- randomized sequences -------------------------------------------------

const COMPONENT_TYPES: [&str; 3] = ["Collider", "MeshRenderer", "Script"];

fn pick<'a>(rng: &mut StdRng, ids: &'a [String]) -> &'a str {
    &ids[rng.gen_range(0..ids.len())]
}

/// A plausible op against the current state. Some are invalid on purpose.
fn random_op(rng: &mut StdRng, doc: &SceneDocument, next_id: &mut usize) -> PatchOp {
    let ids: Vec<String> = doc.entities.keys().cloned().collect();
    let kind = match rng.gen_range(0..11) {
        0 | 1 => {
            *next_id += 1;
            let mut kind = OpKind::create_entity(
                format!("gen{next_id}"),
                format!("Gen {next_id}"),
                pick(rng, &ids),
            );
            if let OpKind::CreateEntity { index, .. } = &mut kind {
                *index = Some(rng.gen_range(0..4));
            }
            kind
        }
        2 => OpKind::delete_entity(pick(rng, &ids)),
        3 => OpKind::set_property(
            pick(rng, &ids),
            "transform.position.y",
            json!(rng.gen_range(-10..10)),
        ),
        4 => OpKind::set_property(pick(rng, &ids), "visible", json!(rng.gen_bool(0.5))),
        5 => OpKind::Reparent {
            entity_id: pick(rng, &ids).to_string(),
            new_parent_id: pick(rng, &ids).to_string(),
            new_index: Some(rng.gen_range(0..3)),
            old_parent_id: None,
            old_index: None,
        },
        6 => OpKind::add_component(
            pick(rng, &ids),
            Component::new(COMPONENT_TYPES[rng.gen_range(0..COMPONENT_TYPES.len())]),
        ),
        7 => OpKind::remove_component(
            pick(rng, &ids),
            COMPONENT_TYPES[rng.gen_range(0..COMPONENT_TYPES.len())],
        ),
        8 => OpKind::set_component_property(
            pick(rng, &ids),
            COMPONENT_TYPES[rng.gen_range(0..COMPONENT_TYPES.len())],
            "settings.level",
            json!(rng.gen_range(0..5)),
        ),
        9 => OpKind::set_property(
            pick(rng, &ids),
            "tuning.three.castShadow",
            json!(rng.gen_bool(0.5)),
        ),
        _ => {
            // Regroup: detach and attach elsewhere in one undo unit.
            let child = pick(rng, &ids).to_string();
            let parent = doc
                .entity(&child)
                .and_then(|e| e.parent_id.clone())
                .unwrap_or_else(|| "root".to_string());
            OpKind::BatchOp {
                ops: vec![
                    PatchOp::new(OpKind::RemoveChild {
                        parent_id: parent,
                        child_id: child.clone(),
                    }),
                    PatchOp::new(OpKind::AddChild {
                        parent_id: pick(rng, &ids).to_string(),
                        child_id: child,
                        index: Some(0),
                    }),
                ],
            }
        }
    };
    PatchOp::new(kind)
}

/// Run a seeded random sequence; return the accepted ops and their inverses.
fn run_sequence(seed: u64, steps: usize) -> (SceneDocument, Vec<PatchOp>, Vec<PatchOp>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut doc = fixture();
    let mut next_id = 0;
    let mut accepted = Vec::new();
    let mut inverses = Vec::new();
    for _ in 0..steps {
        let op = random_op(&mut rng, &doc, &mut next_id);
        let before = doc.clone();
        match apply(&mut doc, &op) {
            Ok(inverse) => {
                if let Err(errors) = validate_document(&doc) {
                    panic!(
                        "seed {seed}: {} broke the tree: {:?}",
                        op.op_type(),
                        errors.iter().map(ToString::to_string).collect::<Vec<_>>()
                    );
                }
                accepted.push(op);
                inverses.push(inverse);
            }
            Err(_) => assert_eq!(doc, before, "seed {seed}: rejected {} mutated", op.op_type()),
        }
    }
    (doc, accepted, inverses)
}

#[test]
fn test_random_sequences_keep_structure_and_undo_fully() {
    for seed in 0..20 {
        let (mut doc, accepted, inverses) = run_sequence(seed, 120);
        assert!(!accepted.is_empty());
        for inverse in inverses.iter().rev() {
            apply(&mut doc, inverse).unwrap();
        }
        assert_eq!(doc, fixture(), "seed {seed}: undo-all did not restore");
    }
}

#[test]
fn test_replay_determinism() {
    for seed in [3, 17, 99] {
        let (expected, accepted, _) = run_sequence(seed, 80);
        let mut first = fixture();
        let mut second = fixture();
        apply_many(&mut first, &accepted).unwrap();
        apply_many(&mut second, &accepted).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, expected);
    }
}

#[test]
fn test_batch_equivalence() {
    for seed in [5, 11, 42] {
        let (individually, accepted, _) = run_sequence(seed, 80);
        let mut batched = fixture();
        let inverse = apply(&mut batched, &PatchOp::batch(accepted)).unwrap();
        assert_eq!(batched, individually);
        apply(&mut batched, &inverse).unwrap();
        assert_eq!(batched, fixture());
    }
}
