use crate::models::common::*;

/// 全てのスウォームエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> &str;

    /// 役割の取得
    fn get_role(&self) -> AgentRole;
}

/// 移動可能なエージェントのインターフェース
pub trait IMovable {
    /// 1ステップの移動処理
    fn update(&mut self, dt: f64, dimension: Dimension);

    /// 力（インパルス）の適用
    fn apply_force(&mut self, force: Vector3D);

    /// 現在位置の取得
    fn get_position(&self) -> Vector3D;

    /// 現在速度（スケーリング前）の取得
    fn get_velocity(&self) -> Vector3D;
}

/// 和声比率を持つエージェントのインターフェース
pub trait IHarmonic {
    /// 割り当てられた音程名
    fn get_harmonic_interval(&self) -> &str;

    /// 解決済みの和声比率
    fn get_harmonic_ratio(&self) -> f64;

    /// 相手に対する有向の和声関係（自分の比率 / 相手の比率）
    fn harmonic_relationship_with(&self, other: &dyn IHarmonic) -> f64 {
        self.get_harmonic_ratio() / other.get_harmonic_ratio()
    }
}
