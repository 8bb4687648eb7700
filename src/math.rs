use bevy::math::Vec3;

pub type Real = f32;
pub const DIM: usize = 3;

pub type Vector = Vec3;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vec3::ZERO
}

/// Unit vector along `v`, or zero when `v` has no direction.
#[inline(always)]
pub fn normalize_or_zero(v: Vector) -> Vector {
    v.normalize_or_zero()
}

/// Distance from the vertical (y) axis.
#[inline(always)]
pub fn horizontal_length(v: Vector) -> Real {
    (v.x * v.x + v.z * v.z).sqrt()
}
