//! # Simulation モジュール
//!
//! シナリオで定義されたエージェント群を固定時間刻み（Δt）で進める簡易ドライバです。
//!
//! 各ステップで、シナリオの記述順に全エージェントについて次を行います：
//!
//! 1. 設定された一定の力があれば `apply_force` で固有速度に加える
//! 2. シナリオの倍率軸で `update(dt, dimension)` を呼び、位置と軌跡を進める
//!
//! エージェントはそれぞれエンジンが単独で所有し、外部へはスナップショットと
//! 読み取り専用の参照だけを渡します。
//!
//! ## 使用例
//!
//! ```no_run
//! use harmonic_swarm::scenario::ScenarioConfig;
//! use harmonic_swarm::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/basic_trio.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1)?;
//! engine.run();
//! for snapshot in engine.snapshots() {
//!     println!("{}", snapshot.to_json()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::models::*;
use crate::scenario::{ScenarioConfig, ScenarioError};
use tracing::{debug, info, trace};

/// エンジンが所有するエージェントと、その一定外力
pub struct SwarmMember {
    pub agent: Agent,
    pub force: Option<Vector3D>,
}

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub dimension: Dimension,
    pub step_count: u64,
    pub total_steps: u64,

    members: Vec<SwarmMember>,

    pub verbose_level: u8,
}

impl SimulationEngine {
    /// シナリオからエンジンを作成
    ///
    /// 検証に通らないシナリオ（dt_s <= 0 など）は受け付けません。
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let members = scenario
            .agents
            .iter()
            .map(|entry| SwarmMember {
                agent: Agent::new(entry.to_agent_config()),
                force: entry.force,
            })
            .collect::<Vec<_>>();

        if verbose_level > 1 {
            for member in &members {
                debug!(
                    "エージェント初期化: {} ({}, 音程 {}, 比率 {:.4})",
                    member.agent.get_id(),
                    member.agent.get_role(),
                    member.agent.get_harmonic_interval(),
                    member.agent.get_harmonic_ratio()
                );
            }
        }

        Ok(Self {
            current_time: 0.0,
            dt: scenario.sim.dt_s,
            max_time: scenario.sim.t_max_s,
            dimension: scenario.sim.dimension,
            step_count: 0,
            total_steps: scenario.total_steps(),
            members,
            verbose_level,
        })
    }

    pub fn run(&mut self) {
        info!("=== シミュレーション実行開始 ({}エージェント) ===", self.members.len());

        while self.step_count < self.total_steps {
            self.step();

            if self.verbose_level > 2 {
                trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!("進行状況: {:.1}% ({:.1}/{:.1}秒)", progress, self.current_time, self.max_time);
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);
    }

    /// 1ステップ進める
    pub fn step(&mut self) {
        for member in &mut self.members {
            if let Some(force) = member.force {
                member.agent.apply_force(force);
            }
            member.agent.update(self.dt, self.dimension);
        }

        self.step_count += 1;
        self.current_time = self.step_count as f64 * self.dt;
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.members.iter().map(|m| &m.agent)
    }

    pub fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.agents().find(|a| a.get_id() == id)
    }

    /// 全エージェントのスナップショット
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents().map(Agent::serialize).collect()
    }

    /// 先頭エージェントを基準とした各エージェントの (ID, 和声関係, 距離)
    pub fn relationships(&self) -> Vec<(String, f64, f64)> {
        let Some(reference) = self.members.first().map(|m| &m.agent) else {
            return Vec::new();
        };

        self.agents()
            .skip(1)
            .map(|agent| {
                (
                    agent.get_id().to_string(),
                    agent.harmonic_relationship_with(reference),
                    agent.distance_to(reference),
                )
            })
            .collect()
    }

    /// 最終状態の概要を表示
    pub fn print_summary(&self) {
        println!("=== 最終状態 (t = {:.2}秒) ===", self.current_time);
        for agent in self.agents() {
            let position = agent.get_position();
            println!(
                "  {}: 位置 ({:.3}, {:.3}, {:.3}), 速さ {:.3}, 軌跡 {}点",
                agent.get_id(),
                position.x,
                position.y,
                position.z,
                agent.get_speed(),
                agent.get_trajectory().len()
            );
        }

        if let Some(reference) = self.agents().next() {
            println!();
            println!("=== 和声関係 (基準: {}) ===", reference.get_id());
            for (id, ratio, distance) in self.relationships() {
                println!("  {}: 比 {:.4}, 距離 {:.3}", id, ratio, distance);
            }
        }
    }
}
