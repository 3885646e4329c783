use crate::models::{AgentConfig, AgentRole, Dimension, Vector3D, DEFAULT_MASS, DEFAULT_MAX_SPEED};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    /// 和声倍率の文脈となる軸（x, y, z）
    #[serde(default)]
    pub dimension: Dimension,
}

/// エージェント設定
#[derive(Debug, Deserialize, Serialize)]
pub struct AgentEntry {
    pub id: String,
    pub interval: String,
    #[serde(default)]
    pub position: Vector3D,
    #[serde(default)]
    pub velocity: Vector3D,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default)]
    pub role: AgentRole,
    /// 毎ステップ update の前に加える一定の力
    #[serde(default)]
    pub force: Option<Vector3D>,
}

fn default_mass() -> f64 {
    DEFAULT_MASS
}

fn default_max_speed() -> f64 {
    DEFAULT_MAX_SPEED
}

impl AgentEntry {
    /// エージェント生成用の設定に変換
    pub fn to_agent_config(&self) -> AgentConfig {
        AgentConfig {
            id: self.id.clone(),
            position: self.position,
            velocity: self.velocity,
            harmonic_interval: self.interval.clone(),
            mass: self.mass,
            max_speed: self.max_speed,
            role: self.role,
        }
    }
}

/// シナリオ全体の設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub agents: Vec<AgentEntry>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.sim.dt_s.is_finite() || self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::Validation("dt_s must be positive and finite".to_string()));
        }
        if !self.sim.t_max_s.is_finite() || self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::Validation("t_max_s must be positive and finite".to_string()));
        }
        if self.agents.is_empty() {
            return Err(ScenarioError::Validation("at least one agent is required".to_string()));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(ScenarioError::Validation("agent id must not be empty".to_string()));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(ScenarioError::Validation(format!("duplicate agent id {}", agent.id)));
            }
            // 質量0以下では力の適用が定義できない
            if agent.mass <= 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "agent {} mass {} must be positive",
                    agent.id, agent.mass
                )));
            }
            if agent.max_speed < 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "agent {} max_speed {} must not be negative",
                    agent.id, agent.max_speed
                )));
            }
        }

        Ok(())
    }

    /// 総ステップ数
    pub fn total_steps(&self) -> u64 {
        (self.sim.t_max_s / self.sim.dt_s).ceil() as u64
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒 ({}ステップ)", self.sim.t_max_s, self.total_steps());
        println!("倍率軸: {:?}", self.sim.dimension);
        println!();

        println!("=== エージェント ===");
        println!("エージェント数: {}", self.agents.len());
        for agent in &self.agents {
            println!(
                "  {}: {} / {} (比率 {:.4}, 質量 {:.2}, 最大速度 {:.2})",
                agent.id,
                agent.role,
                agent.interval,
                crate::models::resolve_ratio(&agent.interval),
                agent.mass,
                agent.max_speed
            );
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
