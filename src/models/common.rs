use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// 3次元ベクトルを表す構造体
///
/// 位置・速度・力のすべてに使う値型です。`Copy` なので、エージェントへの
/// 代入や取り出しのたびに複製され、内部状態が外部と共有されることはありません。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// ゼロベクトル
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// ベクトルの長さ（ユークリッドノルム）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Vector3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    /// 全成分が有限値か
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 大きさ制限（最大値を超える場合は方向を保ったまま一様に縮小）
    pub fn clamp_magnitude(&self, max_magnitude: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_magnitude {
            let factor = max_magnitude / mag;
            Self::new(self.x * factor, self.y * factor, self.z * factor)
        } else {
            *self
        }
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f64> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

/// 倍率計算の文脈となる空間軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    #[default]
    X,
    Y,
    Z,
}

impl Dimension {
    /// 全ての軸（x, y, z の順）
    pub const ALL: [Dimension; 3] = [Dimension::X, Dimension::Y, Dimension::Z];

    /// 軸のインデックス（x=0, y=1, z=2）
    pub fn index(self) -> usize {
        match self {
            Dimension::X => 0,
            Dimension::Y => 1,
            Dimension::Z => 2,
        }
    }
}

/// エージェントの役割
///
/// 外部の協調ロジックが参照する振る舞いタグです。エージェント自身は役割で分岐しません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Leader,
    #[default]
    Follower,
    Scout,
    Coordinator,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Leader => "leader",
            AgentRole::Follower => "follower",
            AgentRole::Scout => "scout",
            AgentRole::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leader" => Ok(AgentRole::Leader),
            "follower" => Ok(AgentRole::Follower),
            "scout" => Ok(AgentRole::Scout),
            "coordinator" => Ok(AgentRole::Coordinator),
            _ => Err(format!("無効な役割: {}. 利用可能: leader, follower, scout, coordinator", s)),
        }
    }
}
