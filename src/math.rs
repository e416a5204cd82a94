//! Math types for ChimeSonic

pub use glam::Vec3;

/// Horizontal angle of `source` seen from `listener`, in degrees.
///
/// Measured with `atan2(dx, dz)`: 0° is straight ahead along +z, +90° is the
/// listener's right (+x), -90° the left. The y axis is ignored.
pub fn azimuth_degrees(listener: Vec3, source: Vec3) -> f32 {
    let dx = source.x - listener.x;
    let dz = source.z - listener.z;
    dx.atan2(dz).to_degrees()
}
