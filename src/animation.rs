use cgmath::InnerSpace;
use std::collections::HashMap;
use tracing::warn;

use crate::skeleton::SkeletonJoint;
use crate::transform::Transform;
use crate::types::*;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// An imported `.bvh` clip: one or more skeletons plus one local transform per animated joint and frame.
///
/// Everything except the display scale is frozen after import.
#[derive(Debug, Clone)]
pub struct SkeletalMotion {
    name: String,
    /// `[frame][skeleton]`
    root_trajectories: Vec<Vec<Position>>,
    /// `[joint index][frame]`, empty for leaf joints
    joint_transforms: Vec<Vec<Transform>>,
    channel_orderings: HashMap<Index, ChannelOrdering>,
    /// first joint with a given name wins
    joint_indices_by_name: HashMap<String, Index>,
    skeleton_roots: Vec<SkeletonJoint>,
    frame_time: f64,
    frame_count: usize,
    skeleton_scale: f64,
}

/// Which outputs [SkeletalMotion::query_skeletal_animation] should fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoseQuery {
    pub frame: Index,
    pub skeleton: Index,
    /// Translate the skeleton by its root trajectory at `frame`.
    pub add_root_offset: bool,
    pub joint_positions: bool,
    pub joint_positions_by_name: bool,
    pub segment_positions: bool,
    pub cumulative_transforms_by_name: bool,
}

impl PoseQuery {
    /// A query that asks for nothing yet.
    pub fn new(frame: Index, skeleton: Index) -> Self {
        PoseQuery {
            frame,
            skeleton,
            ..Default::default()
        }
    }

    /// A query for every output.
    pub fn all(frame: Index, skeleton: Index) -> Self {
        PoseQuery::new(frame, skeleton)
            .with_joint_positions()
            .with_joint_positions_by_name()
            .with_segment_positions()
            .with_cumulative_transforms_by_name()
    }

    pub fn with_root_offset(mut self, add_root_offset: bool) -> Self {
        self.add_root_offset = add_root_offset;
        self
    }

    pub fn with_joint_positions(mut self) -> Self {
        self.joint_positions = true;
        self
    }

    pub fn with_joint_positions_by_name(mut self) -> Self {
        self.joint_positions_by_name = true;
        self
    }

    pub fn with_segment_positions(mut self) -> Self {
        self.segment_positions = true;
        self
    }

    pub fn with_cumulative_transforms_by_name(mut self) -> Self {
        self.cumulative_transforms_by_name = true;
        self
    }

    fn wants_anything(&self) -> bool {
        self.joint_positions
            || self.joint_positions_by_name
            || self.segment_positions
            || self.cumulative_transforms_by_name
    }
}

/// World space pose of one skeleton at one frame. Only the requested outputs are `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    /// Every joint in pre-order.
    pub joint_positions: Option<Vec<Position>>,
    /// First joint in pre-order wins when names repeat.
    pub joint_positions_by_name: Option<HashMap<String, Position>>,
    /// `(parent, child)` world positions, one per bone.
    pub segment_positions: Option<Vec<(Position, Position)>>,
    /// Composition of all ancestor local transforms of each joint (the frame its offset lives in).
    /// First joint in pre-order wins when names repeat.
    pub cumulative_transforms_by_name: Option<HashMap<String, Transform>>,
}

struct PoseContext<'a> {
    joint_transforms: &'a [Vec<Transform>],
    frame: Index,
    scale: f64,
}

impl SkeletalMotion {
    pub(crate) fn new(
        name: String,
        root_trajectories: Vec<Vec<Position>>,
        joint_transforms: Vec<Vec<Transform>>,
        channel_orderings: HashMap<Index, ChannelOrdering>,
        skeleton_roots: Vec<SkeletonJoint>,
        frame_time: f64,
        frame_count: usize,
    ) -> Self {
        let mut joint_indices_by_name = HashMap::new();
        for joint in skeleton_roots.iter().flat_map(|root| root.iter()) {
            joint_indices_by_name
                .entry(joint.name().to_string())
                .or_insert(joint.index());
        }

        SkeletalMotion {
            name,
            root_trajectories,
            joint_transforms,
            channel_orderings,
            joint_indices_by_name,
            skeleton_roots,
            frame_time,
            frame_count,
            skeleton_scale: 1.0,
        }
    }

    /// The file path for files, or the name given when loading from memory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames per second.
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.frame_time
    }

    /// Seconds per frame as written in the file.
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of independent skeletons (`ROOT`s) in the file.
    pub fn skeleton_count(&self) -> usize {
        self.skeleton_roots.len()
    }

    /// # Panics
    /// If `skeleton` is out of range.
    pub fn root(&self, skeleton: Index) -> &SkeletonJoint {
        &self.skeleton_roots[skeleton]
    }

    pub fn roots(&self) -> &[SkeletonJoint] {
        &self.skeleton_roots
    }

    /// World position of a skeleton root at `frame`, before any scaling.
    ///
    /// # Panics
    /// If `frame` or `skeleton` is out of range.
    pub fn root_trajectory(&self, frame: Index, skeleton: Index) -> Position {
        self.assert_in_range(frame, skeleton);
        self.root_trajectories[frame][skeleton]
    }

    /// Uniform scale applied to every position returned by a query.
    pub fn scale(&self) -> f64 {
        self.skeleton_scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.skeleton_scale = scale;
    }

    pub fn set_normalized_scale(&mut self) -> Option<f64> {
        self.set_normalized_scale_with_multiplier(1.0)
    }

    /// Scale the clip so the joint farthest from the origin in the first frame
    /// of the first skeleton (without root trajectory) lands at distance `multiplier`.
    ///
    /// Returns the new scale, or `None` and leaves the scale alone when there is no
    /// frame or every joint sits at the origin.
    pub fn set_normalized_scale_with_multiplier(&mut self, multiplier: f64) -> Option<f64> {
        if self.frame_count == 0 {
            warn!(name = %self.name, "no frames to normalize the scale with");
            return None;
        }

        let mut pose = Pose::default();
        let query = PoseQuery::new(0, 0).with_joint_positions();
        self.evaluate(&query, 1.0, &mut pose);

        let longest = pose
            .joint_positions
            .unwrap_or_default()
            .iter()
            .map(|position| position.magnitude())
            .fold(0.0, f64::max);
        if longest == 0.0 {
            warn!(name = %self.name, "every joint is at the origin, keeping scale");
            return None;
        }

        self.skeleton_scale = multiplier / longest;
        Some(self.skeleton_scale)
    }

    /// Channel layout of the first joint called `name`. `None` for End Sites and unknown names.
    pub fn channel_ordering(&self, name: &str) -> Option<&ChannelOrdering> {
        let index = self.joint_indices_by_name.get(name)?;
        self.channel_orderings.get(index)
    }

    /// First joint called `name` across all skeletons.
    pub fn find_joint_by_name(&self, name: &str) -> Option<&SkeletonJoint> {
        let &index = self.joint_indices_by_name.get(name)?;
        self.skeleton_roots
            .iter()
            .flat_map(|root| root.iter())
            .find(|joint| joint.index() == index)
    }

    /// Every frame's local transform of a joint. `None` for joints without children.
    pub fn local_transforms(&self, joint: &SkeletonJoint) -> Option<&[Transform]> {
        self.joint_transforms
            .get(joint.index())
            .filter(|frames| !frames.is_empty())
            .map(|frames| frames.as_slice())
    }

    /// Local transform of the first joint called `name` at `frame`.
    /// `None` for End Sites and unknown names.
    ///
    /// # Panics
    /// If `frame` is out of range.
    pub fn local_transform_by_name(&self, name: &str, frame: Index) -> Option<&Transform> {
        assert!(
            frame < self.frame_count,
            "frame {frame} out of range, clip has {} frames",
            self.frame_count
        );
        let &index = self.joint_indices_by_name.get(name)?;
        self.joint_transforms.get(index)?.get(frame)
    }

    /// Forward kinematics of one skeleton at one frame.
    ///
    /// Walks the whole skeleton once and fills every requested output in that
    /// walk. Nothing is cached between calls, so query at most once per frame.
    /// A query that asks for no output returns an empty [Pose] without walking.
    ///
    /// # Panics
    /// If the frame or skeleton index is out of range.
    pub fn query_skeletal_animation(&self, query: &PoseQuery) -> Pose {
        let mut pose = Pose::default();
        if query.wants_anything() {
            self.evaluate(query, self.skeleton_scale, &mut pose);
        }
        pose
    }

    /// World positions of every joint in pre-order.
    ///
    /// # Panics
    /// If the frame or skeleton index is out of range.
    pub fn joint_positions(&self, frame: Index, skeleton: Index, add_root_offset: bool) -> Vec<Position> {
        let query = PoseQuery::new(frame, skeleton)
            .with_root_offset(add_root_offset)
            .with_joint_positions();
        self.query_skeletal_animation(&query)
            .joint_positions
            .unwrap_or_default()
    }

    /// Text dump of every skeleton, see [SkeletonJoint::dump].
    pub fn hierarchy_dump(&self) -> String {
        self.skeleton_roots.iter().map(|root| root.dump()).collect()
    }

    fn assert_in_range(&self, frame: Index, skeleton: Index) {
        assert!(
            frame < self.frame_count,
            "frame {frame} out of range, clip has {} frames",
            self.frame_count
        );
        assert!(
            skeleton < self.skeleton_roots.len(),
            "skeleton {skeleton} out of range, clip has {} skeletons",
            self.skeleton_roots.len()
        );
    }

    fn evaluate(&self, query: &PoseQuery, scale: f64, pose: &mut Pose) {
        self.assert_in_range(query.frame, query.skeleton);

        let root = &self.skeleton_roots[query.skeleton];
        let root_transform = if query.add_root_offset {
            Transform::from_origin(self.root_trajectories[query.frame][query.skeleton])
        } else {
            Transform::identity()
        };

        if query.joint_positions {
            pose.joint_positions = Some(Vec::new());
        }
        if query.joint_positions_by_name {
            pose.joint_positions_by_name = Some(HashMap::new());
        }
        if query.segment_positions {
            pose.segment_positions = Some(Vec::new());
        }
        if query.cumulative_transforms_by_name {
            pose.cumulative_transforms_by_name = Some(HashMap::new());
        }

        let context = PoseContext {
            joint_transforms: &self.joint_transforms,
            frame: query.frame,
            scale,
        };
        __query_recursive(root, &root_transform, None, &context, pose);
    }
}

/// Visit `joint` whose offset is expressed in `cumulative`, then its children.
fn __query_recursive(
    joint: &SkeletonJoint,
    cumulative: &Transform,
    parent_position: Option<Position>,
    context: &PoseContext,
    pose: &mut Pose,
) {
    // scale only touches the final coordinate, never the transform chain
    let position = cumulative.transform_point(joint.local_offset()) * context.scale;

    if let Some(transforms) = &mut pose.cumulative_transforms_by_name {
        if !transforms.contains_key(joint.name()) {
            transforms.insert(joint.name().to_string(), *cumulative);
        }
    }
    if let Some(positions) = &mut pose.joint_positions {
        positions.push(position);
    }
    if let Some(positions) = &mut pose.joint_positions_by_name {
        if !positions.contains_key(joint.name()) {
            positions.insert(joint.name().to_string(), position);
        }
    }
    if let (Some(segments), Some(parent_position)) = (&mut pose.segment_positions, parent_position) {
        segments.push((parent_position, position));
    }

    // leaves have no local transform and no children to pass one on to
    if joint.is_leaf() {
        return;
    }
    let local = &context.joint_transforms[joint.index()][context.frame];
    let next = cumulative.compose(local);
    for child in joint.children() {
        __query_recursive(child, &next, Some(position), context, pose);
    }
}
