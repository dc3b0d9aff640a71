use cgmath::{Matrix3, Vector3};
use std::fmt;
use std::str::FromStr;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Depth = usize;
pub type Position = Vector3<f64>;
pub type Rotation = Matrix3<f64>;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// One of the three cartesian axes. The discriminant is the component index into a [Position].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub fn index(self) -> Index {
        self as Index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Position,
    Rotation,
}

/// A single animated degree of freedom as declared after `CHANNELS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    pub kind: ChannelKind,
    pub axis: Axis,
}

impl FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, axis) = match s {
            "Xposition" => (ChannelKind::Position, Axis::X),
            "Yposition" => (ChannelKind::Position, Axis::Y),
            "Zposition" => (ChannelKind::Position, Axis::Z),
            "Xrotation" => (ChannelKind::Rotation, Axis::X),
            "Yrotation" => (ChannelKind::Rotation, Axis::Y),
            "Zrotation" => (ChannelKind::Rotation, Axis::Z),
            _ => return Err(()),
        };
        Ok(Channel { kind, axis })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        let kind = match self.kind {
            ChannelKind::Position => "position",
            ChannelKind::Rotation => "rotation",
        };
        write!(f, "{axis}{kind}")
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Channel layout of an animated joint, in declaration order.
///
/// Roots carry three position axes followed by three rotation axes,
/// every other animated joint only the three rotation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelOrdering {
    pub position: Option<[Axis; 3]>,
    pub rotation: [Axis; 3],
}

impl ChannelOrdering {
    /// Number of channels the joint declared (3 or 6).
    pub fn channel_count(&self) -> usize {
        if self.position.is_some() {
            6
        } else {
            3
        }
    }

    /// Flat list of axis indices, positions first, as they appeared in the file.
    pub fn axis_indices(&self) -> Vec<Index> {
        self.position
            .iter()
            .flatten()
            .chain(self.rotation.iter())
            .map(|axis| axis.index())
            .collect()
    }
}
