//! Math type re-exports and transform helpers.
//!
//! Node transforms are stored as plain `[f64; N]` arrays on the graph;
//! this module converts between those arrays and `glam` matrices.

pub use glam::{DMat4, DQuat, DVec3, DVec4, Mat4, Quat, Vec3};

/// Identity translation.
pub const ZERO_TRANSLATION: [f64; 3] = [0.0, 0.0, 0.0];

/// Identity rotation quaternion (x, y, z, w).
pub const IDENTITY_ROTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Identity scale.
pub const UNIT_SCALE: [f64; 3] = [1.0, 1.0, 1.0];

/// Column-major 4x4 identity.
#[rustfmt::skip]
pub const IDENTITY_MATRIX: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Compose a column-major matrix from translation, rotation and scale.
pub fn compose_matrix(translation: [f64; 3], rotation: [f64; 4], scale: [f64; 3]) -> DMat4 {
    DMat4::from_scale_rotation_translation(
        DVec3::from_array(scale),
        DQuat::from_array(rotation),
        DVec3::from_array(translation),
    )
}

/// Decompose a column-major matrix into translation, rotation and scale.
pub fn decompose_matrix(matrix: &DMat4) -> ([f64; 3], [f64; 4], [f64; 3]) {
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    (translation.to_array(), rotation.to_array(), scale.to_array())
}

/// Component-wise approximate equality.
pub fn approx_eq(a: &[f64], b: &[f64], epsilon: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= epsilon)
}
