use strata_animation_core::interp::euler_deg_to_quat;
use strata_animation_core::{
    ActionId, AnimationSystem, Channel, Config, EntityId, Interpolation, KeyingMode, KeyingTarget,
    MemoryWorld, Transform,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn posed_world() -> (MemoryWorld, EntityId) {
    let mut world = MemoryWorld::new();
    let e = world.spawn(Transform {
        translation: [1.0, 2.0, 3.0],
        rotation: euler_deg_to_quat([0.0, 0.0, 45.0]),
        scale: [1.0, 1.5, 2.0],
        ..Transform::default()
    });
    (world, e)
}

fn keys_of(sys: &AnimationSystem, id: ActionId, ch: Channel) -> Vec<(i32, f32)> {
    sys.action(id)
        .and_then(|a| a.track(ch))
        .map(|t| t.curve.keyframes.iter().map(|k| (k.frame, k.value)).collect())
        .unwrap_or_default()
}

#[test]
fn replace_twice_at_same_frame_keeps_one_key() {
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("a");
    assert!(sys.key_value(id, Channel::TranslateX, 12, 1.0, KeyingMode::Replace));
    assert!(sys.key_value(id, Channel::TranslateX, 12, 4.0, KeyingMode::Replace));
    assert_eq!(keys_of(&sys, id, Channel::TranslateX), vec![(12, 4.0)]);
}

#[test]
fn add_mode_collision_keeps_newest() {
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("a");
    sys.key_value(id, Channel::ScaleY, 8, 1.0, KeyingMode::Add);
    sys.key_value(id, Channel::ScaleY, 2, 0.5, KeyingMode::Add);
    sys.key_value(id, Channel::ScaleY, 8, 3.0, KeyingMode::Add);
    assert_eq!(keys_of(&sys, id, Channel::ScaleY), vec![(2, 0.5), (8, 3.0)]);

    let action = sys.action(id).unwrap();
    assert_eq!((action.start, action.end), (2, 8));
}

#[test]
fn keying_unknown_action_is_a_no_op() {
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("a");
    sys.remove_action(id);
    assert!(!sys.key_value(id, Channel::TranslateX, 0, 1.0, KeyingMode::Replace));
    assert!(!sys.key_value(Default::default(), Channel::TranslateX, 0, 1.0, KeyingMode::Replace));
}

#[test]
fn new_tracks_use_configured_interpolation() {
    let mut sys = AnimationSystem::new(Config {
        default_interpolation: Interpolation::Bezier,
        ..Config::default()
    });
    let id = sys.create_action("a");
    sys.key_value(id, Channel::RotateY, 0, 10.0, KeyingMode::Replace);
    let track = sys.action(id).unwrap().track(Channel::RotateY).unwrap();
    assert_eq!(track.curve.interpolation, Interpolation::Bezier);
}

#[test]
fn key_all_trs_writes_every_enabled_channel() {
    let (world, e) = posed_world();
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("pose");
    sys.keying_settings_mut().target = KeyingTarget {
        action: id,
        restrict_to_entity: None,
    };

    assert_eq!(sys.key_all_trs(&world, e, 5, None), 9);
    assert_eq!(keys_of(&sys, id, Channel::TranslateY), vec![(5, 2.0)]);
    assert_eq!(keys_of(&sys, id, Channel::ScaleZ), vec![(5, 2.0)]);
    let rz = keys_of(&sys, id, Channel::RotateZ);
    approx(rz[0].1, 45.0, 1e-3);
}

#[test]
fn key_all_trs_honors_component_flags_and_override() {
    let (world, e) = posed_world();
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("pose");
    {
        let k = sys.keying_settings_mut();
        k.target.action = id;
        k.key_translate = false;
        k.key_scale = false;
    }

    assert_eq!(sys.key_all_trs(&world, e, 3, Some([10.0, 20.0, 370.0])), 3);
    assert!(keys_of(&sys, id, Channel::TranslateX).is_empty());
    assert!(keys_of(&sys, id, Channel::ScaleX).is_empty());
    // The override is keyed verbatim, not normalized through a quaternion.
    assert_eq!(keys_of(&sys, id, Channel::RotateZ), vec![(3, 370.0)]);
}

#[test]
fn key_all_trs_gates() {
    let (world, e) = posed_world();
    let mut sys = AnimationSystem::default();

    // No target action.
    assert_eq!(sys.key_all_trs(&world, e, 0, None), 0);

    let id = sys.create_action("pose");
    sys.keying_settings_mut().target = KeyingTarget {
        action: id,
        restrict_to_entity: Some(EntityId(42)),
    };
    assert_eq!(sys.key_all_trs(&world, e, 0, None), 0);

    sys.keying_settings_mut().target.restrict_to_entity = Some(e);
    assert_eq!(sys.key_all_trs(&world, EntityId(42), 0, None), 0);
    assert_eq!(sys.action(id).unwrap().key_count(), 0);

    assert_eq!(sys.key_all_trs(&world, e, 0, None), 9);
}

#[test]
fn transform_edits_key_only_with_auto_key() {
    let (mut world, e) = posed_world();
    let mut sys = AnimationSystem::default();
    let id = sys.create_action("auto");
    sys.keying_settings_mut().target.action = id;
    sys.set_frame(&mut world, 12);

    assert_eq!(sys.on_transform_edited(&world, e), 0);

    sys.keying_settings_mut().auto_key = true;
    assert_eq!(sys.on_transform_edited(&world, e), 9);
    assert_eq!(keys_of(&sys, id, Channel::TranslateZ), vec![(12, 3.0)]);
}
