use clap::{Arg, Command};
use harmonic_swarm::logging::{self, LogConfig, LogOutput};
use harmonic_swarm::models::interval_names;
use harmonic_swarm::models::resolve_ratio;
use harmonic_swarm::scenario::ScenarioConfig;
use harmonic_swarm::simulation::SimulationEngine;
use tracing::{error, info};

fn main() {
    let matches = Command::new("hswarm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("和声スウォームシミュレーション (Harmonic Swarm)")
        .long_about("音程比率で速度を変調するエージェント群のシミュレーション\n\
                     シナリオの各エージェントを固定時間刻みで進め、最終状態を表示します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .action(clap::ArgAction::SetTrue)
                .help("終了時に全エージェントのスナップショットをJSON Linesで出力")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: トレース)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。指定時は -v より優先")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| logging::parse_log_level(s))
        .unwrap_or_else(|| logging::level_from_verbosity(verbose_level));

    let log_config = LogConfig {
        level,
        output: matches.get_one::<LogOutput>("log-output").copied().unwrap_or(LogOutput::Console),
        log_dir: matches.get_one::<String>("log-dir").cloned().unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };

    // ガードはプログラム終了まで保持する
    let _log_guard = match logging::init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        if let Err(e) = run_scenario(
            scenario_path,
            matches.get_flag("info"),
            matches.get_flag("snapshot"),
            verbose_level,
        ) {
            error!("{}", e);
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    } else {
        show_default_help();
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    emit_snapshots: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!("シナリオファイル読み込み完了: {}", scenario_path);

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    if !emit_snapshots {
        scenario.print_summary();
        println!();
    }

    let mut simulation = SimulationEngine::new(scenario, verbose_level)?;
    simulation.run();

    if emit_snapshots {
        for snapshot in simulation.snapshots() {
            println!("{}", snapshot.to_json()?);
        }
    } else {
        simulation.print_summary();
    }

    Ok(())
}

/// デフォルトヘルプと音程一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  hswarm [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("      --snapshot          最終スナップショットをJSON Linesで出力");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-output <T>    ログ出力先 (console, file, both)");
    println!("      --log-level <LEVEL> ログレベル");
    println!("      --log-dir <DIR>     ログディレクトリ");
    println!("  -h, --help              このヘルプを表示");
    println!();
    println!("利用可能な音程:");
    for name in interval_names() {
        println!("  {:<14} {:.4}", name, resolve_ratio(name));
    }
    println!();
    println!("例:");
    println!("  hswarm -s scenarios/basic_trio.yaml");
    println!("  hswarm -s scenarios/basic_trio.yaml -vv --log-output both");
    println!("  hswarm -s scenarios/basic_trio.yaml --snapshot");
}
