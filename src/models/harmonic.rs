//! # 和声インターバル表と倍率関数
//!
//! 音程名（"unison", "fifth", "octave" など）から純正律の比率への固定対応表と、
//! 比率と空間軸から速度倍率を求める純粋関数を提供します。
//!
//! 対応表はプロセス全体で共有される読み取り専用の定数で、ロックなしで
//! 全エージェント・全スレッドから参照できます。

use crate::models::common::Dimension;

/// 音程名と比率の対応表（純正律）
static INTERVAL_TABLE: [(&str, f64); 13] = [
    ("unison", 1.0),
    ("minor_second", 16.0 / 15.0),
    ("major_second", 9.0 / 8.0),
    ("minor_third", 6.0 / 5.0),
    ("major_third", 5.0 / 4.0),
    ("fourth", 4.0 / 3.0),
    ("tritone", 45.0 / 32.0),
    ("fifth", 3.0 / 2.0),
    ("minor_sixth", 8.0 / 5.0),
    ("major_sixth", 5.0 / 3.0),
    ("minor_seventh", 16.0 / 9.0),
    ("major_seventh", 15.0 / 8.0),
    ("octave", 2.0),
];

/// 未解決の音程名に適用する比率（スケーリングなし）
pub const DEFAULT_RATIO: f64 = 1.0;

/// 軸ごとの指数（x: 比率そのもの, y: 平方根, z: 立方根）
const DIMENSION_EXPONENTS: [f64; 3] = [1.0, 1.0 / 2.0, 1.0 / 3.0];

/// 音程名から比率を検索
///
/// 名前は完全一致で照合します（大文字・空白の正規化はしません）。表にない名前は `None`。
pub fn lookup_ratio(interval: &str) -> Option<f64> {
    INTERVAL_TABLE
        .iter()
        .find(|(name, _)| *name == interval)
        .map(|(_, ratio)| *ratio)
}

/// 音程名を比率に解決
///
/// 表にない名前は [`DEFAULT_RATIO`] (1.0) に縮退します。
pub fn resolve_ratio(interval: &str) -> f64 {
    lookup_ratio(interval).unwrap_or(DEFAULT_RATIO)
}

/// 登録されている音程名の一覧（比率の昇順）
pub fn interval_names() -> impl Iterator<Item = &'static str> {
    INTERVAL_TABLE.iter().map(|(name, _)| *name)
}

/// 和声倍率を計算
///
/// `ratio ^ exponent(dimension)` を返します。同じ入力には常に同じ値を返すため、
/// 別々のマシンに複製された同一設定のエージェントは追加の同期なしに歩調を揃えます。
///
/// - 比率 1.0 はどの軸でも倍率 1.0
/// - 正の比率について連続かつ単調増加
/// - 正でない比率（表からは生じない）は 1.0
pub fn harmonic_multiplier(ratio: f64, dimension: Dimension) -> f64 {
    if ratio <= 0.0 || !ratio.is_finite() {
        return DEFAULT_RATIO;
    }
    ratio.powf(DIMENSION_EXPONENTS[dimension.index()])
}
