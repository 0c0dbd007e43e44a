//! Flat pools of vectors stored in BODY 2 (vertices) and BODY 3 (normals) of vehicle files.
use crate::{ByteCursor, RbhError, Vector3};

const VECTOR3_SIZE: u64 = 12;

/// Reads a count prefixed array of [Vector3] at the current position.
/// Values are returned as stored without any coordinate conversion.
pub fn read_pool(cursor: &mut ByteCursor) -> Result<Vec<Vector3>, RbhError> {
    let count = cursor.read_u32()?;
    cursor.ensure_remaining(count as u64 * VECTOR3_SIZE)?;
    (0..count).map(|_| cursor.read::<Vector3>()).collect()
}
