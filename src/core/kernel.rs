use std::f32::consts::PI;

use crate::math::Real;

/// Poly6 smoothing kernel `315 / (64 π h⁹) · (h² − r²)³`.
///
/// Zero outside `[0, h]`, and continuous at `r = h`.
#[inline]
pub fn poly6(r: Real, h: Real) -> Real {
    if !(0.0..=h).contains(&r) {
        return 0.0;
    }
    let factor = 315.0 / (64.0 * PI * h.powi(9));
    factor * (h * h - r * r).powi(3)
}

/// Scalar multiplying the unit separation vector in the pressure gradient,
/// `−945 / (32 π h⁹) · (h² − r²)(3h² − 7r²)`.
#[inline]
pub fn pressure_gradient_coefficient(r: Real, h: Real) -> Real {
    let factor = -945.0 / (32.0 * PI * h.powi(9));
    let r2 = r * r;
    let h2 = h * h;
    factor * (h2 - r2) * (3.0 * h2 - 7.0 * r2)
}
