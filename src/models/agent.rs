use crate::models::{
    common::{AgentRole, Dimension, Vector3D},
    harmonic::{self, harmonic_multiplier},
    snapshot::{AgentSnapshot, SnapshotError},
    traits::{IAgent, IHarmonic, IMovable},
};
use chrono::Utc;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// 軌跡履歴の最大長
pub const TRAJECTORY_CAPACITY: usize = 100;
/// スナップショットに含まれない質量の既定値
pub const DEFAULT_MASS: f64 = 1.0;
/// スナップショットに含まれない最大速度の既定値
pub const DEFAULT_MAX_SPEED: f64 = 10.0;

/// エージェント生成時の完全な設定
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub id: String,
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub harmonic_interval: String,
    /// 正の値であること（0以下では力の適用が未定義）
    pub mass: f64,
    pub max_speed: f64,
    pub role: AgentRole,
}

impl AgentConfig {
    /// 原点で静止し、既定の質量・最大速度・役割を持つ設定を作成
    pub fn new(id: impl Into<String>, harmonic_interval: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Vector3D::zero(),
            velocity: Vector3D::zero(),
            harmonic_interval: harmonic_interval.into(),
            mass: DEFAULT_MASS,
            max_speed: DEFAULT_MAX_SPEED,
            role: AgentRole::default(),
        }
    }
}

/// reset に渡す部分設定
///
/// `None` のフィールドは変更されません。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentReset {
    pub position: Option<Vector3D>,
    pub velocity: Option<Vector3D>,
    pub harmonic_interval: Option<String>,
}

/// 和声スウォームのエージェント
///
/// 位置・固有速度・和声比率・質量・速度上限・役割と、直近の軌跡を保持します。
/// 内部同期は持たないため、同一インスタンスへの変更操作（update, apply_force, reset）は
/// 所有者が直列化する必要があります。別々のインスタンスは並列に更新できます。
#[derive(Debug, Clone)]
pub struct Agent {
    id: String,
    position: Vector3D,
    /// 固有速度。update はこれを書き換えず、毎ステップここから倍率を再計算する
    velocity: Vector3D,
    harmonic_interval: String,
    /// harmonic_interval の解決結果。設定時にのみ更新する
    harmonic_ratio: f64,
    mass: f64,
    max_speed: f64,
    role: AgentRole,
    trajectory: VecDeque<Vector3D>,
}

impl Agent {
    /// 新しいエージェントを作成します
    ///
    /// # 引数
    ///
    /// * `config` - ID・初期位置/速度・音程名・質量・最大速度・役割
    ///
    /// # 戻り値
    ///
    /// 軌跡が空のエージェント。音程名が表にない場合は比率 1.0 で動作します。
    pub fn new(config: AgentConfig) -> Self {
        let harmonic_ratio = Self::resolve_interval(&config.id, &config.harmonic_interval);

        Self {
            id: config.id,
            position: config.position,
            velocity: config.velocity,
            harmonic_interval: config.harmonic_interval,
            harmonic_ratio,
            mass: config.mass,
            max_speed: config.max_speed,
            role: config.role,
            trajectory: VecDeque::with_capacity(TRAJECTORY_CAPACITY + 1),
        }
    }

    fn resolve_interval(id: &str, interval: &str) -> f64 {
        match harmonic::lookup_ratio(interval) {
            Some(ratio) => ratio,
            None => {
                warn!(
                    "エージェント {}: 未知の音程 '{}'。比率 {} を使用します",
                    id,
                    interval,
                    harmonic::DEFAULT_RATIO
                );
                harmonic::DEFAULT_RATIO
            }
        }
    }

    /// 1ステップの運動更新
    ///
    /// 1. `m = harmonic_multiplier(ratio, dimension)` を計算
    /// 2. 固有速度に `m` を一様に掛ける（軸ごとではなく3成分すべて同じ倍率）
    /// 3. 速さが max_speed を超える場合は方向を保って max_speed に縮小
    /// 4. 位置を `v' * dt` だけ進め、軌跡に追加（100件を超えたら最古を破棄）
    ///
    /// 固有速度は書き換えません。`dt` が負または NaN の場合の挙動は未定義です。
    ///
    /// # 戻り値
    ///
    /// このステップで実際に使われたスケーリング後の速度
    pub fn update(&mut self, dt: f64, dimension: Dimension) -> Vector3D {
        let multiplier = harmonic_multiplier(self.harmonic_ratio, dimension);
        let scaled = self.velocity * multiplier;

        let step_velocity = scaled.clamp_magnitude(self.max_speed);
        if step_velocity != scaled {
            trace!(
                "エージェント {}: 速さ {:.3} を上限 {:.3} に制限",
                self.id,
                scaled.magnitude(),
                self.max_speed
            );
        }

        self.position = self.position + step_velocity * dt;
        self.record_position();

        step_velocity
    }

    fn record_position(&mut self) {
        self.trajectory.push_back(self.position);
        if self.trajectory.len() > TRAJECTORY_CAPACITY {
            self.trajectory.pop_front();
        }
    }

    /// 力を適用（単位時間のインパルス Δv = F / m）
    ///
    /// 固有速度を直接変更します。質量が0以下の場合は未定義です。
    pub fn apply_force(&mut self, force: Vector3D) {
        self.velocity = self.velocity + force / self.mass;
    }

    /// 他エージェントとのユークリッド距離
    pub fn distance_to(&self, other: &Agent) -> f64 {
        self.position.distance_3d(&other.position)
    }

    /// 部分設定で再構成し、軌跡を必ずクリアします
    pub fn reset(&mut self, partial: AgentReset) {
        if let Some(position) = partial.position {
            self.position = position;
        }
        if let Some(velocity) = partial.velocity {
            self.velocity = velocity;
        }
        if let Some(interval) = partial.harmonic_interval {
            self.harmonic_ratio = Self::resolve_interval(&self.id, &interval);
            self.harmonic_interval = interval;
        }
        self.trajectory.clear();

        debug!(
            "エージェント {} をリセット: 位置 ({:.2}, {:.2}, {:.2}), 音程 {} (比率 {:.4})",
            self.id,
            self.position.x,
            self.position.y,
            self.position.z,
            self.harmonic_interval,
            self.harmonic_ratio
        );
    }

    /// 軌跡履歴（古い順）
    pub fn get_trajectory(&self) -> Vec<Vector3D> {
        self.trajectory.iter().copied().collect()
    }

    pub fn get_mass(&self) -> f64 {
        self.mass
    }

    pub fn get_max_speed(&self) -> f64 {
        self.max_speed
    }

    /// 固有速度の大きさ（スケーリング前）
    pub fn get_speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// スナップショットを作成
    ///
    /// 質量・最大速度・軌跡は含めません。
    pub fn serialize(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.clone(),
            position: self.position,
            velocity: self.velocity,
            harmonic_interval: self.harmonic_interval.clone(),
            role: Some(self.role),
            timestamp: Some(Utc::now().timestamp_millis()),
        }
    }

    /// スナップショットからエージェントを復元
    ///
    /// 質量 1.0、最大速度 10.0 を補い、役割が欠落していれば follower とします。
    pub fn deserialize(snapshot: AgentSnapshot) -> Self {
        Self::new(AgentConfig {
            id: snapshot.id,
            position: snapshot.position,
            velocity: snapshot.velocity,
            harmonic_interval: snapshot.harmonic_interval,
            mass: DEFAULT_MASS,
            max_speed: DEFAULT_MAX_SPEED,
            role: snapshot.role.unwrap_or_default(),
        })
    }

    /// JSON文字列へ直列化
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        self.serialize().to_json()
    }

    /// JSON文字列から復元
    pub fn from_json(payload: &str) -> Result<Self, SnapshotError> {
        AgentSnapshot::from_json(payload).map(Self::deserialize)
    }
}

impl IAgent for Agent {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_role(&self) -> AgentRole {
        self.role
    }
}

impl IMovable for Agent {
    fn update(&mut self, dt: f64, dimension: Dimension) {
        Agent::update(self, dt, dimension);
    }

    fn apply_force(&mut self, force: Vector3D) {
        Agent::apply_force(self, force);
    }

    fn get_position(&self) -> Vector3D {
        self.position
    }

    fn get_velocity(&self) -> Vector3D {
        self.velocity
    }
}

impl IHarmonic for Agent {
    fn get_harmonic_interval(&self) -> &str {
        &self.harmonic_interval
    }

    fn get_harmonic_ratio(&self) -> f64 {
        self.harmonic_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, interval: &str, velocity: Vector3D, max_speed: f64) -> Agent {
        Agent::new(AgentConfig {
            velocity,
            max_speed,
            ..AgentConfig::new(id, interval)
        })
    }

    #[test]
    fn test_new_resolves_ratio() {
        let a = agent("a1", "fifth", Vector3D::zero(), 10.0);
        assert_eq!(a.get_id(), "a1");
        assert_eq!(a.get_harmonic_interval(), "fifth");
        assert_eq!(a.get_harmonic_ratio(), 1.5);
        assert!(a.get_trajectory().is_empty());

        let typo = agent("a2", "fith", Vector3D::zero(), 10.0);
        assert_eq!(typo.get_harmonic_ratio(), 1.0);
    }

    #[test]
    fn test_update_clamps_to_max_speed() {
        let mut a = agent("a1", "unison", Vector3D::new(10.0, 0.0, 0.0), 5.0);
        let step = a.update(1.0, Dimension::X);

        assert_eq!(step.magnitude(), 5.0);
        assert_eq!(a.get_position(), Vector3D::new(5.0, 0.0, 0.0));
        // 固有速度は変わらない
        assert_eq!(a.get_velocity(), Vector3D::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_update_applies_single_multiplier_to_all_components() {
        let mut a = agent("a1", "octave", Vector3D::new(1.0, 1.0, 1.0), 100.0);
        let step = a.update(0.5, Dimension::X);

        assert_eq!(step, Vector3D::new(2.0, 2.0, 2.0));
        assert_eq!(a.get_position(), Vector3D::new(1.0, 1.0, 1.0));

        let step_y = a.update(1.0, Dimension::Y);
        let m = 2.0_f64.sqrt();
        assert!((step_y.x - m).abs() < 1e-12);
        assert!((step_y.y - m).abs() < 1e-12);
        assert!((step_y.z - m).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_speed_never_exceeds_max_speed() {
        let mut a = agent("a1", "major_seventh", Vector3D::new(3.0, -4.0, 12.0), 7.5);
        for i in 0..50 {
            let dimension = Dimension::ALL[i % 3];
            let step = a.update(0.1, dimension);
            assert!(step.magnitude() <= 7.5 + 1e-9);
            a.apply_force(Vector3D::new(0.5, 0.0, -0.25));
        }
    }

    #[test]
    fn test_repeated_updates_use_intrinsic_velocity() {
        let mut a = agent("a1", "fifth", Vector3D::new(2.0, 0.0, 0.0), 100.0);
        let first = a.update(1.0, Dimension::X);
        let second = a.update(1.0, Dimension::X);
        assert_eq!(first, second);
        assert_eq!(a.get_position(), Vector3D::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_trajectory_keeps_most_recent_positions() {
        let mut a = agent("a1", "unison", Vector3D::new(1.0, 0.0, 0.0), 10.0);
        for _ in 0..150 {
            a.update(1.0, Dimension::X);
            assert!(a.get_trajectory().len() <= TRAJECTORY_CAPACITY);
        }

        let trajectory = a.get_trajectory();
        assert_eq!(trajectory.len(), TRAJECTORY_CAPACITY);
        for (i, position) in trajectory.iter().enumerate() {
            assert_eq!(position.x, (51 + i) as f64);
        }
    }

    #[test]
    fn test_apply_force_divides_by_mass() {
        let mut a = Agent::new(AgentConfig {
            mass: 2.0,
            ..AgentConfig::new("a1", "unison")
        });
        a.apply_force(Vector3D::new(10.0, 0.0, 0.0));
        assert_eq!(a.get_velocity().x, 5.0);
        assert_eq!(a.get_velocity().y, 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let mut a = agent("a", "unison", Vector3D::zero(), 10.0);
        let b = Agent::new(AgentConfig {
            position: Vector3D::new(3.0, 4.0, 12.0),
            ..AgentConfig::new("b", "unison")
        });

        assert_eq!(a.distance_to(&b), 13.0);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));

        a.reset(AgentReset {
            position: Some(Vector3D::new(3.0, 4.0, 12.0)),
            ..Default::default()
        });
        assert_eq!(a.distance_to(&b), 0.0);
    }

    #[test]
    fn test_harmonic_relationship_is_directed_inverse() {
        let a = agent("a", "fifth", Vector3D::zero(), 10.0);
        let b = agent("b", "octave", Vector3D::zero(), 10.0);

        assert_eq!(a.harmonic_relationship_with(&b), 0.75);
        assert!((a.harmonic_relationship_with(&b) * b.harmonic_relationship_with(&a) - 1.0).abs() < 1e-12);
        assert_eq!(a.harmonic_relationship_with(&a), 1.0);
    }

    #[test]
    fn test_reset_overwrites_present_fields_and_clears_history() {
        let mut a = agent("a1", "unison", Vector3D::new(1.0, 0.0, 0.0), 10.0);
        a.update(1.0, Dimension::X);
        a.update(1.0, Dimension::X);

        a.reset(AgentReset {
            harmonic_interval: Some("octave".to_string()),
            ..Default::default()
        });
        assert!(a.get_trajectory().is_empty());
        assert_eq!(a.get_position(), Vector3D::new(2.0, 0.0, 0.0));
        assert_eq!(a.get_velocity(), Vector3D::new(1.0, 0.0, 0.0));
        assert_eq!(a.get_harmonic_ratio(), 2.0);

        a.reset(AgentReset {
            position: Some(Vector3D::zero()),
            velocity: Some(Vector3D::new(0.0, 3.0, 0.0)),
            harmonic_interval: Some("unknown".to_string()),
        });
        assert_eq!(a.get_position(), Vector3D::zero());
        assert_eq!(a.get_velocity(), Vector3D::new(0.0, 3.0, 0.0));
        assert_eq!(a.get_harmonic_interval(), "unknown");
        assert_eq!(a.get_harmonic_ratio(), 1.0);

        a.reset(AgentReset::default());
        assert!(a.get_trajectory().is_empty());
    }

    #[test]
    fn test_serialize_round_trip_keeps_identity_only() {
        let mut original = Agent::new(AgentConfig {
            position: Vector3D::new(1.5, -2.0, 3.25),
            velocity: Vector3D::new(0.5, 0.25, -1.0),
            mass: 4.0,
            max_speed: 2.0,
            role: AgentRole::Leader,
            ..AgentConfig::new("a1", "major_third")
        });
        original.update(1.0, Dimension::Z);

        let payload = original.to_json().unwrap();
        let restored = Agent::from_json(&payload).unwrap();

        assert_eq!(restored.get_id(), original.get_id());
        assert_eq!(restored.get_position(), original.get_position());
        assert_eq!(restored.get_velocity(), original.get_velocity());
        assert_eq!(restored.get_harmonic_interval(), original.get_harmonic_interval());
        assert_eq!(restored.get_harmonic_ratio(), original.get_harmonic_ratio());
        assert_eq!(restored.get_role(), AgentRole::Leader);
        assert_eq!(restored.get_mass(), DEFAULT_MASS);
        assert_eq!(restored.get_max_speed(), DEFAULT_MAX_SPEED);
        assert!(restored.get_trajectory().is_empty());
    }

    #[test]
    fn test_serialize_omits_local_state() {
        let a = agent("a1", "fifth", Vector3D::zero(), 3.0);
        let value = serde_json::to_value(a.serialize()).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("timestamp"));
        assert!(object.contains_key("harmonicInterval"));
        assert!(!object.contains_key("mass"));
        assert!(!object.contains_key("maxSpeed"));
        assert!(!object.contains_key("trajectory"));
    }

    #[test]
    fn test_deserialize_substitutes_defaults() {
        let payload = r#"{"id":"a1","position":{"x":1,"y":2,"z":3},"velocity":{"x":0,"y":0,"z":0},"harmonicInterval":"fifth"}"#;
        let a = Agent::from_json(payload).unwrap();

        assert_eq!(a.get_mass(), 1.0);
        assert_eq!(a.get_max_speed(), 10.0);
        assert_eq!(a.get_role(), AgentRole::Follower);
        assert_eq!(a.get_harmonic_ratio(), 1.5);
        assert_eq!(a.get_position(), Vector3D::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_deserialize_unknown_role_falls_back_to_follower() {
        let payload = r#"{"id":"a1","position":{"x":1,"y":2,"z":3},"velocity":{"x":0,"y":0,"z":0},"harmonicInterval":"fifth","role":"captain","timestamp":1760000000000.5}"#;
        let a = Agent::from_json(payload).unwrap();

        assert_eq!(a.get_id(), "a1");
        assert_eq!(a.get_role(), AgentRole::Follower);
        assert_eq!(a.get_harmonic_ratio(), 1.5);
    }

    #[test]
    fn test_deserialize_malformed_payload() {
        assert!(Agent::from_json("not json").is_err());
    }

    #[test]
    fn test_trait_objects() {
        let mut a = agent("a1", "unison", Vector3D::new(1.0, 0.0, 0.0), 10.0);
        let movable: &mut dyn IMovable = &mut a;
        movable.update(2.0, Dimension::Y);
        assert_eq!(movable.get_position(), Vector3D::new(2.0, 0.0, 0.0));

        let harmonic: &dyn IHarmonic = &a;
        assert_eq!(harmonic.get_harmonic_ratio(), 1.0);
    }
}
