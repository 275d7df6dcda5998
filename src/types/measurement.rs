use serde::{Deserialize, Serialize};

/// 三轴加速度计读数 (m/s²)
///
/// 配置文件中以 `[x, y, z]` 数组形式出现。
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Measurement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Measurement {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl From<[f64; 3]> for Measurement {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Measurement> for [f64; 3] {
    fn from(m: Measurement) -> Self {
        m.components()
    }
}
