//! Importer for Biovision Hierarchy (`.bvh`) motion capture files.
//!
//! A file is loaded into a [SkeletalMotion]: one or more skeleton trees plus a local
//! [Transform] per animated joint and frame. World space joint positions, bone segments
//! and accumulated transforms are computed on demand with
//! [SkeletalMotion::query_skeletal_animation].
//!
//! ```no_run
//! use bvh_motion::{load_bvh_from_file, PoseQuery};
//!
//! let mut motion = load_bvh_from_file("walk.bvh")?;
//! motion.set_normalized_scale();
//! let pose = motion.query_skeletal_animation(&PoseQuery::all(0, 0).with_root_offset(true));
//! for (joint, position) in motion.root(0).iter().zip(pose.joint_positions.unwrap()) {
//!     println!("{}: {:?}", joint.name(), position);
//! }
//! # Ok::<(), bvh_motion::ImportError>(())
//! ```

pub mod animation;
pub mod errors;
mod hierarchy;
mod motion;
pub mod parse;
pub mod skeleton;
pub mod tokens;
pub mod transform;
pub mod types;
mod utils;

pub use animation::{Pose, PoseQuery, SkeletalMotion};
pub use errors::ImportError;
pub use hierarchy::END_SITE_SUFFIX;
pub use parse::{
    load_bvh_from_bytes, load_bvh_from_file, load_bvh_from_file_with_options, load_bvh_from_string, EndSiteOffset,
    ImportOptions, DEFAULT_MAX_DEPTH,
};
pub use skeleton::{JointVisit, SkeletonJoint, SkeletonQuery};
pub use transform::Transform;
