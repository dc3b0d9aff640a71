use cgmath::{Deg, Matrix3, SquareMatrix};

use crate::types::{Axis, Rotation};

/// Elementary rotation about `axis` by an angle in DEGREES.
/// Right handed, positive angles turn counter-clockwise looking down the axis.
pub(crate) fn __rotation_matrix(axis: Axis, degrees: f64) -> Rotation {
    let angle = Deg(degrees);
    match axis {
        Axis::X => Matrix3::from_angle_x(angle),
        Axis::Y => Matrix3::from_angle_y(angle),
        Axis::Z => Matrix3::from_angle_z(angle),
    }
}

/// Compose elementary rotations left to right in the order the channels were declared,
/// i.e. `ZXY` gives `R(z) * R(x) * R(y)`.
pub(crate) fn __compose_rotation(order: &[Axis; 3], degrees: [f64; 3]) -> Rotation {
    order
        .iter()
        .zip(degrees)
        .map(|(&axis, angle)| __rotation_matrix(axis, angle))
        .fold(Rotation::identity(), |rotation, elementary| rotation * elementary)
}
