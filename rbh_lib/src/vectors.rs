use binrw::BinRead;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 3 contiguous floats for encoding positions or normals.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, PartialEq, Clone, Copy, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3 { x, y, z }
    }

    /// Converts between the game's coordinate system and the exported coordinate system.
    /**
    ```rust
    use rbh_lib::Vector3;

    let v = Vector3::new(1f32, 2f32, -3f32);
    assert_eq!(Vector3::new(1f32, -2f32, 3f32), v.negate_yz());
    ```
    */
    pub fn negate_yz(self) -> Vector3 {
        Vector3::new(self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

impl std::ops::Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Self) -> Self::Output {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// A UV texture coordinate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, Debug, PartialEq, Clone, Copy, Default)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl TexCoord {
    pub fn new(u: f32, v: f32) -> TexCoord {
        TexCoord { u, v }
    }
}
