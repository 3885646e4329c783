// 基本的なデータ型（ベクトル・軸・役割）
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 和声インターバル表と倍率関数
pub mod harmonic;

// ワイヤーフォーマット
pub mod snapshot;

// エージェント本体
pub mod agent;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use harmonic::{harmonic_multiplier, interval_names, lookup_ratio, resolve_ratio, DEFAULT_RATIO};
pub use snapshot::{AgentSnapshot, SnapshotError};
pub use agent::{Agent, AgentConfig, AgentReset, DEFAULT_MASS, DEFAULT_MAX_SPEED, TRAJECTORY_CAPACITY};
