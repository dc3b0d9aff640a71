use cgmath::InnerSpace;
use std::collections::HashMap;
use std::fmt::Write;

use crate::types::{Depth, Index, Position};

/////////////////////////////////////////////////////////////////////////////////////////////////

/// A node of the skeleton tree. Each joint owns its children.
///
/// End Sites are joints too: they have no children and are never animated.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonJoint {
    name: String,
    index: Index,
    offset: Position,
    children: Vec<SkeletonJoint>,
}

/// One step of a pre-order walk.
#[derive(Debug, Clone, Copy)]
pub struct JointVisit<'a> {
    pub joint: &'a SkeletonJoint,
    pub parent: Option<&'a SkeletonJoint>,
    pub depth: Depth,
}

/// Name lookup and bone list of a (sub)skeleton, see [SkeletonJoint::query_skeleton].
#[derive(Debug, Clone, Default)]
pub struct SkeletonQuery<'a> {
    /// First joint in pre-order wins when names repeat.
    pub joints_by_name: HashMap<&'a str, &'a SkeletonJoint>,
    /// `(parent, child)` name pairs, one per edge, in pre-order of the child.
    pub bones_by_joint_names: Vec<(&'a str, &'a str)>,
}

impl SkeletonJoint {
    pub(crate) fn new(name: String, index: Index, offset: Position, children: Vec<SkeletonJoint>) -> Self {
        SkeletonJoint {
            name,
            index,
            offset,
            children,
        }
    }

    /// Not guaranteed to be unique within a file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-order position of this joint among all joints of the file (End Sites included).
    pub fn index(&self) -> Index {
        self.index
    }

    /// Offset from the parent joint.
    pub fn local_offset(&self) -> Position {
        self.offset
    }

    /// Direct children. Empty for End Sites.
    pub fn children(&self) -> &[SkeletonJoint] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk over this joint and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![JointVisit {
                joint: self,
                parent: None,
                depth: 0,
            }],
        }
    }

    /// Pre-order iteration over this joint and all of its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &SkeletonJoint> {
        self.walk().map(|visit| visit.joint)
    }

    pub fn joint_count(&self) -> usize {
        self.iter().count()
    }

    /// First joint in pre-order with this name.
    pub fn find_joint_by_name(&self, name: &str) -> Option<&SkeletonJoint> {
        self.iter().find(|joint| joint.name == name)
    }

    /// Collect the name lookup and the bone list of the subtree rooted here.
    /// Walks the whole subtree, so cache the result rather than calling this per frame.
    pub fn query_skeleton(&self) -> SkeletonQuery<'_> {
        let mut query = SkeletonQuery::default();
        for visit in self.walk() {
            query
                .joints_by_name
                .entry(visit.joint.name())
                .or_insert(visit.joint);
            if let Some(parent) = visit.parent {
                query
                    .bones_by_joint_names
                    .push((parent.name(), visit.joint.name()));
            }
        }
        query
    }

    pub fn joints_by_name(&self) -> HashMap<&str, &SkeletonJoint> {
        self.query_skeleton().joints_by_name
    }

    pub fn bones_by_joint_names(&self) -> Vec<(&str, &str)> {
        self.query_skeleton().bones_by_joint_names
    }

    /// Longest local offset in the subtree.
    pub fn max_offset_length(&self) -> f64 {
        self.iter()
            .map(|joint| joint.offset.magnitude())
            .fold(0.0, f64::max)
    }

    /// Text dump of the subtree, one joint per line, depth marked with `_`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for visit in self.walk() {
            // writing to a String cannot fail
            let _ = writeln!(out, "{}{}", "_".repeat(visit.depth), visit.joint.name);
        }
        out
    }

    /// Divide this joint's offset by `normalizer`. Import-time only.
    pub(crate) fn apply_offset_normalization(&mut self, normalizer: f64) {
        self.offset /= normalizer;
    }

    /// Divide every offset in the subtree by `normalizer`.
    pub(crate) fn normalize_offsets(&mut self, normalizer: f64) {
        let mut stack = vec![self];
        while let Some(joint) = stack.pop() {
            joint.apply_offset_normalization(normalizer);
            stack.extend(joint.children.iter_mut());
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Iterator returned by [SkeletonJoint::walk].
pub struct Walk<'a> {
    stack: Vec<JointVisit<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = JointVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        // reversed so the first child is visited first
        self.stack.extend(visit.joint.children.iter().rev().map(|child| JointVisit {
            joint: child,
            parent: Some(visit.joint),
            depth: visit.depth + 1,
        }));
        Some(visit)
    }
}
