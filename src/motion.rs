use cgmath::Zero;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::ImportError;
use crate::hierarchy::MOTION_KEYWORD;
use crate::skeleton::SkeletonJoint;
use crate::tokens::Tokens;
use crate::transform::Transform;
use crate::types::*;
use crate::utils::__compose_rotation;

const FRAMES_KEYWORD: &str = "Frames:";
const FRAME_KEYWORD: &str = "Frame";
const TIME_KEYWORD: &str = "Time:";

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Decoded `MOTION` section.
#[derive(Debug)]
pub(crate) struct Motion {
    pub frame_count: usize,
    pub frame_time: f64,
    /// `[frame][root]` world position of each skeleton root.
    pub root_trajectories: Vec<Vec<Position>>,
    /// `[joint index][frame]`, empty for joints without children.
    pub joint_transforms: Vec<Vec<Transform>>,
}

/// Read the `MOTION` header at `motion_token` and every frame after it.
///
/// `root_scales` divides each root's trajectory (all ones unless offsets were normalized).
pub(crate) fn parse_motion(
    tokens: &Tokens,
    motion_token: Index,
    roots: &[SkeletonJoint],
    root_scales: &[f64],
    channel_orderings: &HashMap<Index, ChannelOrdering>,
    joint_count: usize,
) -> Result<Motion, ImportError> {
    let start = motion_token;
    tokens.expect(start, MOTION_KEYWORD)?;
    tokens.expect(start + 1, FRAMES_KEYWORD)?;
    let frames = tokens.get(start + 2, "a frame count")?;
    let frame_count = frames.parse::<usize>().map_err(|_| ImportError::InvalidNumber {
        index: start + 2,
        token: frames.to_string(),
    })?;
    tokens.expect(start + 3, FRAME_KEYWORD)?;
    tokens.expect(start + 4, TIME_KEYWORD)?;
    let frame_time = tokens.number(start + 5)?;
    if frame_time <= 0.0 {
        return Err(ImportError::InvalidFrameTime(frame_time));
    }

    // Check the amount of data before decoding so an absurd frame count can't allocate
    let values_per_frame: usize = roots.iter().map(__values_per_frame).sum();
    let first_value = start + 6;
    let found = tokens.len() - first_value.min(tokens.len());
    let expected = frame_count.saturating_mul(values_per_frame);
    if expected != found {
        return Err(ImportError::FrameDataMismatch { expected, found });
    }
    debug!(frame_count, frame_time, values_per_frame, "reading motion");

    let mut joint_transforms = vec![Vec::new(); joint_count];
    for root in roots {
        for joint in root.iter().filter(|joint| !joint.is_leaf()) {
            joint_transforms[joint.index()] = Vec::with_capacity(frame_count);
        }
    }

    let mut root_trajectories = Vec::with_capacity(frame_count);
    let mut current = first_value;
    for _ in 0..frame_count {
        let mut root_positions = Vec::with_capacity(roots.len());
        for (root, &scale) in roots.iter().zip(root_scales) {
            let ordering = __ordering(channel_orderings, root)?;
            let mut position = Position::zero();
            for (i, axis) in ordering.position.iter().flatten().enumerate() {
                position[axis.index()] = tokens.number(current + i)?;
            }
            root_positions.push(position / scale);
            current += 3;

            __read_frame_recursive(tokens, &mut current, root, true, channel_orderings, &mut joint_transforms)?;
        }
        root_trajectories.push(root_positions);
    }

    if current != tokens.len() {
        return Err(ImportError::FrameDataMismatch {
            expected: current - first_value,
            found,
        });
    }

    Ok(Motion {
        frame_count,
        frame_time,
        root_trajectories,
        joint_transforms,
    })
}

/// Root position plus three rotations for every joint that has children.
fn __values_per_frame(root: &SkeletonJoint) -> usize {
    3 + 3 * root.iter().filter(|joint| !joint.is_leaf()).count()
}

fn __ordering<'a>(
    channel_orderings: &'a HashMap<Index, ChannelOrdering>,
    joint: &SkeletonJoint,
) -> Result<&'a ChannelOrdering, ImportError> {
    // every ROOT/JOINT production stored an ordering, only End Sites lack one
    channel_orderings
        .get(&joint.index())
        .ok_or_else(|| ImportError::InvalidChannelLayout {
            joint: joint.name().to_string(),
            reason: "joint has no channels",
        })
}

/// Read one frame of rotations for `joint` and its subtree in pre-order.
/// Leaf joints consume nothing and get no transform.
fn __read_frame_recursive(
    tokens: &Tokens,
    current: &mut Index,
    joint: &SkeletonJoint,
    is_root: bool,
    channel_orderings: &HashMap<Index, ChannelOrdering>,
    joint_transforms: &mut [Vec<Transform>],
) -> Result<(), ImportError> {
    if joint.is_leaf() {
        return Ok(());
    }

    let ordering = __ordering(channel_orderings, joint)?;
    debug_assert_eq!(ordering.position.is_some(), is_root);
    let angles = [
        tokens.number(*current)?,
        tokens.number(*current + 1)?,
        tokens.number(*current + 2)?,
    ];
    let rotation = __compose_rotation(&ordering.rotation, angles);
    joint_transforms[joint.index()].push(Transform::new(rotation, joint.local_offset()));
    *current += 3;

    for child in joint.children() {
        __read_frame_recursive(tokens, current, child, false, channel_orderings, joint_transforms)?;
    }
    Ok(())
}
