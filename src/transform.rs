use cgmath::{Matrix, SquareMatrix, Zero};
use std::ops::Mul;

use crate::types::{Position, Rotation};

/// A rigid affine map: an orthonormal rotation followed by a translation to `origin`.
///
/// Only rigid transforms are supported. [Transform::inverse] relies on the
/// rotation being orthonormal and gives meaningless results otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    rotation: Rotation,
    origin: Position,
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            rotation: Rotation::identity(),
            origin: Position::zero(),
        }
    }

    pub fn new(rotation: Rotation, origin: Position) -> Self {
        Transform { rotation, origin }
    }

    /// Pure translation.
    pub fn from_origin(origin: Position) -> Self {
        Transform {
            rotation: Rotation::identity(),
            origin,
        }
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Position) {
        self.origin = origin;
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// `self.compose(other)` applies `other` first, then `self`.
    /// Composing parent then local is how transforms accumulate down a skeleton.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            rotation: self.rotation * other.rotation,
            origin: self.rotation * other.origin + self.origin,
        }
    }

    /// Rotate a direction. The origin is ignored.
    pub fn transform_vector(&self, direction: Position) -> Position {
        self.rotation * direction
    }

    pub fn transform_point(&self, point: Position) -> Position {
        self.rotation * point + self.origin
    }

    /// `(Rᵗ, -Rᵗ·origin)`.
    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.transpose();
        Transform {
            rotation,
            origin: -(rotation * self.origin),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        self.compose(&rhs)
    }
}
