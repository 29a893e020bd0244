// PvP 排名命令行工具
// 开发心理：薄封装，解析参数后调用库函数，结果统一输出为 JSON
// 错误在 main 中记录并以非零状态退出

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;

use pvprank::{
    filter_level_caps, rank_all, BaseStats, Ivs, PvpQuery, PvpRanker, RankerConfig,
};

/// 宝可梦GO PvP 个体值排名工具
#[derive(Parser, Debug)]
#[command(name = "pvprank", version, about, long_about = None)]
struct Cli {
    /// 配置文件 (TOML 或 JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 宝可梦数据文件 (JSON)
    #[arg(long, global = true)]
    master: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按种族值对全部个体值组合排名
    Rank {
        #[arg(long)]
        attack: u16,
        #[arg(long)]
        defense: u16,
        #[arg(long)]
        stamina: u16,
        /// CP上限
        #[arg(long, default_value_t = 1500)]
        cap: u32,
        #[arg(long, default_value_t = 50.0)]
        level_cap: f64,
        #[arg(long, default_value_t = 0)]
        iv_floor: u8,
        /// 输出前 N 名
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// 查询一只宝可梦及其进化在各联盟中的排名
    Query {
        #[arg(long)]
        pokemon: u16,
        #[arg(long, default_value_t = 0)]
        form: u16,
        #[arg(long, default_value_t = 0)]
        costume: u16,
        #[arg(long, default_value_t = 0)]
        gender: u8,
        /// 个体值，格式 A/D/S
        #[arg(long)]
        ivs: Ivs,
        #[arg(long, default_value_t = 1.0)]
        level: f64,
        /// 只保留与这些等级上限相关的结果
        #[arg(long, value_delimiter = ',')]
        level_caps: Vec<f64>,
    },
    /// 各联盟的排行榜
    Top {
        #[arg(long)]
        pokemon: u16,
        #[arg(long, default_value_t = 0)]
        form: u16,
        #[arg(long, default_value_t = 0)]
        evolution: u16,
        #[arg(long, default_value_t = 10)]
        max_rank: u16,
        #[arg(long, default_value_t = 0)]
        iv_floor: u8,
    },
    /// 计算CP
    Cp {
        #[arg(long)]
        pokemon: u16,
        #[arg(long, default_value_t = 0)]
        form: u16,
        #[arg(long, default_value_t = 0)]
        evolution: u16,
        #[arg(long)]
        ivs: Ivs,
        #[arg(long)]
        level: f64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("执行失败: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RankerConfig::load_from_file(path)
            .with_context(|| format!("无法加载配置文件 {:?}", path))?,
        None => RankerConfig::default(),
    };

    match cli.command {
        Command::Rank {
            attack,
            defense,
            stamina,
            cap,
            level_cap,
            iv_floor,
            top,
        } => {
            let stats = BaseStats::new(attack, defense, stamina);
            let bucket = rank_all(&stats, cap, level_cap, iv_floor, config.comparator)?;
            info!("共 {} 个可行组合", bucket.len());
            let shown = &bucket.sorted()[..top.min(bucket.len())];
            print_json(&shown)
        }
        Command::Query {
            pokemon,
            form,
            costume,
            gender,
            ivs,
            level,
            level_caps,
        } => {
            let ranker = open_ranker(config, cli.master.as_ref())?;
            let query = PvpQuery::new(pokemon, ivs, level)
                .with_form(form)
                .with_costume(costume)
                .with_gender(gender);
            let mut result = ranker.query_pvp_rank(&query)?;
            if !level_caps.is_empty() {
                for entries in result.values_mut() {
                    *entries = filter_level_caps(entries, &level_caps);
                }
                result.retain(|_, entries| !entries.is_empty());
            }
            print_json(&result)
        }
        Command::Top {
            pokemon,
            form,
            evolution,
            max_rank,
            iv_floor,
        } => {
            let ranker = open_ranker(config, cli.master.as_ref())?;
            let result = ranker.calculate_top_ranks(max_rank, pokemon, form, evolution, iv_floor)?;
            print_json(&result)
        }
        Command::Cp {
            pokemon,
            form,
            evolution,
            ivs,
            level,
        } => {
            let ranker = open_ranker(config, cli.master.as_ref())?;
            let cp = ranker.calculate_cp(pokemon, form, evolution, ivs, level)?;
            println!("{}", cp);
            Ok(())
        }
    }
}

fn open_ranker(config: RankerConfig, master: Option<&PathBuf>) -> Result<PvpRanker> {
    let master = master.context("该命令需要 --master 指定数据文件")?;
    let ranker = PvpRanker::new(config)?;
    ranker
        .load_pokemon_data(master)
        .with_context(|| format!("无法加载数据文件 {:?}", master))?;
    Ok(ranker)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
