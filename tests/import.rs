use bvh_motion::{
    load_bvh_from_bytes, load_bvh_from_file, load_bvh_from_string, ImportError, ImportOptions, SkeletalMotion,
};
use bvh_motion::types::Position;

const WALK: &str = include_str!("data/walk.bvh");
const DUET: &str = include_str!("data/duet.bvh");

fn data_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Every animated joint has one transform per frame, End Sites have none.
fn assert_transform_tables(motion: &SkeletalMotion) {
    for root in motion.roots() {
        for joint in root.iter() {
            match motion.local_transforms(joint) {
                Some(frames) => {
                    assert!(!joint.is_leaf());
                    assert_eq!(frames.len(), motion.frame_count(), "{}", joint.name());
                }
                None => assert!(joint.is_leaf(), "{} has no transforms", joint.name()),
            }
        }
    }
}

#[test_log::test]
fn walk_from_file() {
    let path = data_path("walk.bvh");
    let motion = load_bvh_from_file(&path).unwrap();

    assert_eq!(motion.name(), path);
    assert_eq!(motion.frame_count(), 3);
    assert_eq!(motion.frame_time(), 0.0333333);
    assert_eq!(motion.sampling_rate().round(), 30.0);
    assert_eq!(motion.skeleton_count(), 1);

    let root = motion.root(0);
    assert_eq!(root.name(), "Hips");
    // 7 ROOT/JOINT keywords and 3 End Sites
    assert_eq!(root.joint_count(), 10);
    assert_eq!(root.iter().filter(|joint| joint.is_leaf()).count(), 3);
    assert_eq!(root.bones_by_joint_names().len(), 9);
    assert_eq!(
        root.iter().map(|joint| joint.name()).collect::<Vec<_>>(),
        vec![
            "Hips",
            "Spine",
            "Head",
            "Head_end",
            "LeftUpLeg",
            "LeftLeg",
            "LeftLeg_end",
            "RightUpLeg",
            "RightLeg",
            "RightLeg_end",
        ]
    );
    assert_transform_tables(&motion);

    assert_eq!(motion.root_trajectory(2, 0), Position::new(2.0, 91.0, 0.0));
}

#[test]
fn string_and_file_agree() {
    let from_file = load_bvh_from_file(data_path("walk.bvh")).unwrap();
    let from_string = load_bvh_from_string(WALK).unwrap();

    assert_eq!(from_string.name(), "");
    assert_eq!(from_file.roots(), from_string.roots());
    for joint in from_file.root(0).iter() {
        assert_eq!(from_file.local_transforms(joint), from_string.local_transforms(joint));
    }
}

#[test]
fn whitespace_and_non_ascii_bytes_separate_tokens() {
    let reference = load_bvh_from_string(WALK).unwrap();

    let crlf = WALK.replace('\n', "\r\n");
    let motion = load_bvh_from_string(&crlf).unwrap();
    assert_eq!(motion.roots(), reference.roots());

    let mut bytes = WALK.replace("Spine\n", "Sp\u{e9}ine\n").into_bytes();
    bytes.push(0);
    let motion = load_bvh_from_bytes("latin", &bytes, &ImportOptions::default());
    // the accent splits `Spine` into two tokens
    assert!(matches!(motion, Err(ImportError::UnexpectedToken { .. })));
}

#[test]
fn several_skeletons_with_the_same_names() {
    let motion = load_bvh_from_string(DUET).unwrap();
    assert_eq!(motion.skeleton_count(), 2);
    assert_eq!(motion.root(0).name(), motion.root(1).name());
    assert_transform_tables(&motion);

    // by-name access resolves to the first skeleton
    let chest = motion.local_transform_by_name("Chest", 0).unwrap();
    assert_eq!(chest.origin(), Position::new(0.0, 10.0, 0.0));
    assert_eq!(motion.find_joint_by_name("Chest").unwrap().index(), 1);
    assert_eq!(motion.root(1).find_joint_by_name("Chest").unwrap().index(), 4);

    assert_eq!(motion.root_trajectory(0, 0), Position::new(-50.0, 0.0, 0.0));
    assert_eq!(motion.root_trajectory(0, 1), Position::new(50.0, 0.0, 0.0));
}

#[test_log::test]
fn malformed_files_are_rejected() {
    let missing_offset = WALK.replacen("OFFSET 0.00 -40.00 0.00", "", 1);
    assert!(matches!(
        load_bvh_from_string(&missing_offset),
        Err(ImportError::UnexpectedToken { expected: "OFFSET", .. })
    ));

    let four_channels = WALK.replacen("CHANNELS 3", "CHANNELS 4", 1);
    assert!(matches!(
        load_bvh_from_string(&four_channels),
        Err(ImportError::InvalidChannelCount { .. })
    ));

    let missing_frame = WALK.replace("Frames: 3", "Frames: 4");
    assert!(matches!(
        load_bvh_from_string(&missing_frame),
        Err(ImportError::FrameDataMismatch { expected: 96, found: 72 })
    ));

    let trailing = format!("{WALK} 0.00");
    assert!(matches!(
        load_bvh_from_string(&trailing),
        Err(ImportError::FrameDataMismatch { expected: 72, found: 73 })
    ));

    let bad_number = WALK.replacen("90.00", "ninety", 1);
    assert!(matches!(
        load_bvh_from_string(&bad_number),
        Err(ImportError::InvalidNumber { .. })
    ));

    let no_hierarchy = WALK.replace("HIERARCHY", "");
    assert!(matches!(
        load_bvh_from_string(&no_hierarchy),
        Err(ImportError::UnexpectedToken { index: 0, .. })
    ));

    let no_motion = &WALK[..WALK.find("MOTION").unwrap()];
    assert!(matches!(
        load_bvh_from_string(no_motion),
        Err(ImportError::UnexpectedEof { .. })
    ));
}

#[test]
fn truncated_files_never_panic() {
    let tokens: Vec<&str> = WALK.split_whitespace().collect();
    for len in 0..tokens.len() {
        let text = tokens[..len].join(" ");
        assert!(load_bvh_from_string(&text).is_err(), "prefix of {len} tokens imported");
    }
    assert!(load_bvh_from_string(&tokens.join(" ")).is_ok());
}
