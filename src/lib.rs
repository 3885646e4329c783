//! # harmonic-swarm
//!
//! 音程比率で運動を変調する自律エージェント群のための、エージェント状態と運動則のライブラリです。
//!
//! - [`models`]: ベクトル・和声インターバル表・エージェント・スナップショット
//! - [`scenario`]: YAMLシナリオの読み込み
//! - [`simulation`]: シナリオを固定時間刻みで進める簡易ドライバ
//! - [`logging`]: tracing によるログ初期化

pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
