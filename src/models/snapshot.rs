//! # エージェントスナップショット（ワイヤーフォーマット）
//!
//! ネットワーク境界を越えてエージェント状態を複製するための平坦な JSON 構造です。
//! 質量・最大速度・軌跡は各ノードのローカル状態として扱い、含めません。
//!
//! ```json
//! {
//!   "id": "a1",
//!   "position": {"x": 1.0, "y": 2.0, "z": 3.0},
//!   "velocity": {"x": 0.0, "y": 0.0, "z": 0.0},
//!   "harmonicInterval": "fifth",
//!   "role": "leader",
//!   "timestamp": 1760000000000
//! }
//! ```

use crate::models::common::{AgentRole, Vector3D};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// スナップショットの符号化・復号エラー
///
/// 構造化データとして解釈できないペイロードだけが、このコアで回復可能なエラーです。
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("スナップショット解析エラー: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("スナップショット符号化エラー: {0}")]
    Encode(#[source] serde_json::Error),
}

/// エージェントスナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    pub id: String,
    pub position: Vector3D,
    pub velocity: Vector3D,
    /// 未解決の音程名は受信側で比率 1.0 に縮退する
    pub harmonic_interval: String,
    /// 欠落・null・未知の値は None（復元時は follower）
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_role")]
    pub role: Option<AgentRole>,
    /// 取得時刻（UNIXエポックからのミリ秒）。復元には使わない。数値でなければ None
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<AgentRole>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse::<AgentRole>() {
            Ok(role) => Some(role),
            Err(_) => {
                warn!("スナップショット: 未知の役割 '{}'。follower を使用します", s);
                None
            }
        },
        Some(other) => {
            warn!("スナップショット: 役割が文字列ではありません ({})。follower を使用します", other);
            None
        }
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

impl AgentSnapshot {
    /// JSON文字列へ符号化
    ///
    /// JSON は NaN・無限大を表現できないため、非有限の成分を含む場合は
    /// [`SnapshotError::Encode`] を返します。
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        for (field, vector) in [("position", &self.position), ("velocity", &self.velocity)] {
            if !vector.is_finite() {
                return Err(SnapshotError::Encode(serde::ser::Error::custom(format!(
                    "{} に非有限の成分があります: ({}, {}, {})",
                    field, vector.x, vector.y, vector.z
                ))));
            }
        }
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// JSON文字列から復号
    pub fn from_json(payload: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(payload).map_err(SnapshotError::Parse)
    }
}
