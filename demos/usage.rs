use bvh_motion::types::Position;
use bvh_motion::{load_bvh_from_file, load_bvh_from_string, PoseQuery, SkeletalMotion, SkeletonJoint, Transform};

fn main() {
    ////////////////////////////// loading .bvh ///////////////////////////////////////////
    // load bvh from a file
    let motion: SkeletalMotion = load_bvh_from_file("./tests/data/walk.bvh").unwrap();

    // or from a string
    // (`include_str` works at compile time and so has a different base path than `load_bvh_from_file` - ignore the difference)
    let bvh_string: &str = include_str!("../tests/data/walk.bvh");
    let mut motion: SkeletalMotion = load_bvh_from_string(bvh_string).unwrap_or(motion);

    //////////////////////////////// clip metadata ////////////////
    {
        let frame_time: f64 = motion.frame_time();
        let frame_count: usize = motion.frame_count();

        assert_eq!(frame_count, 3);
        // sampling rate is the reciprocal of frame time
        assert_eq!((motion.sampling_rate() - 1.0 / frame_time).abs(), 0.0);
        assert_eq!(motion.skeleton_count(), 1);
    }

    //////////////////////////////// skeleton tree ////////////////
    {
        let root: &SkeletonJoint = motion.root(0);
        // joints are numbered in pre-order, End Sites included
        let knee: &SkeletonJoint = root.find_joint_by_name("LeftLeg").unwrap();
        assert_eq!(knee.index(), 5);
        assert_eq!(knee.local_offset(), Position::new(0.0, -40.0, 0.0));

        // End Sites are leaves named after their parent
        let foot: &SkeletonJoint = &knee.children()[0];
        assert_eq!(foot.name(), "LeftLeg_end");
        assert!(foot.is_leaf());

        for visit in root.walk() {
            let parent = visit.parent.map(|parent| parent.name()).unwrap_or("-");
            println!("{}{} (parent {parent})", "  ".repeat(visit.depth), visit.joint.name());
        }

        // bones as (parent, child) name pairs
        let bones: Vec<(&str, &str)> = root.bones_by_joint_names();
        assert_eq!(bones.len(), root.joint_count() - 1);
    }

    //////////////////////////////// local transforms ////////////////
    {
        // rotation of the joint plus its offset, one per frame
        let hip: &Transform = motion.local_transform_by_name("LeftUpLeg", 1).unwrap();
        let knee_in_hip_space: Position = hip.transform_point(Position::new(0.0, -40.0, 0.0));
        println!("knee relative to the hips at frame 1: {knee_in_hip_space:?}");

        // End Sites are not animated
        assert!(motion.local_transform_by_name("LeftLeg_end", 1).is_none());
    }

    //////////////////////////////// forward kinematics ////////////////
    // scale the clip so its farthest joint is 1 unit from the origin
    motion.set_normalized_scale();

    // ask for any combination of outputs, they are all computed in a single walk
    let query = PoseQuery::new(1, 0)
        .with_root_offset(true)
        .with_joint_positions_by_name()
        .with_segment_positions();
    let pose = motion.query_skeletal_animation(&query);

    let positions = pose.joint_positions_by_name.unwrap();
    println!("left foot at frame 1: {:?}", positions["LeftLeg_end"]);
    for (from, to) in pose.segment_positions.unwrap() {
        println!("bone {from:?} -> {to:?}");
    }
    assert!(pose.joint_positions.is_none());
}
