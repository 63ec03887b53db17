//! Math utilities and types
//!
//! Provides the nalgebra aliases used across the spatial core and the
//! rigid [`Transform`] that moves points between a body's local frame
//! and world space.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid frame: a position plus a unit-quaternion orientation
///
/// Scale is not part of the frame; shapes such as
/// [`Trimesh`](crate::physics::collision::Trimesh) carry their own
/// componentwise scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion (unit length)
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World point -> local point: subtract the position, then undo the rotation
    pub fn point_to_local(&self, world_point: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(world_point - self.position))
    }

    /// Local point -> world point: rotate, then add the position
    pub fn point_to_world(&self, local_point: &Vec3) -> Vec3 {
        self.rotation * local_point + self.position
    }

    /// Rotate a world-space direction into the local frame (no translation)
    pub fn vector_to_local_frame(&self, world_vector: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(world_vector)
    }

    /// Rotate a local direction into world space (no translation)
    pub fn vector_to_world_frame(&self, local_vector: &Vec3) -> Vec3 {
        self.rotation * local_vector
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// Create a transform from a rigid transformation matrix
    ///
    /// Any scale baked into the upper-left block is divided out before the
    /// rotation is extracted. If an axis has zero scale the rotation can't
    /// be recovered and is left as identity.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();

        if scale_x == 0.0 || scale_y == 0.0 || scale_z == 0.0 {
            return Self { position, rotation: Quat::identity() };
        }

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self { position, rotation }
    }

    /// Combine this transform with another (`self` applied last)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        Transform {
            position: inv_rotation * (-self.position),
            rotation: inv_rotation,
        }
    }
}

/// Extension trait for Mat4 with camera helpers
pub trait Mat4Ext {
    /// Right-handed perspective projection with OpenGL clip depth `[-1, 1]`
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}
