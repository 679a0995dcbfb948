use clap::{Parser, ValueEnum};
use monty_hall::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// 三门问题模拟器
#[derive(Debug, Parser)]
#[command(name = "monty-hall", version)]
struct Args {
    /// 门数
    #[arg(long, default_value_t = 3)]
    doors: u32,

    /// 轮数
    #[arg(long, default_value_t = 100000)]
    rounds: u32,

    /// 挑战者的抉择方式
    #[arg(long, value_enum, default_value_t = PolicyArg::Random)]
    strategy: PolicyArg,

    /// 随机种子，不指定时使用系统熵
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum PolicyArg {
    Keep,
    Switch,
    Random,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Keep => Policy::Fixed(Strategy::Keep),
            PolicyArg::Switch => Policy::Fixed(Strategy::Switch),
            PolicyArg::Random => Policy::Random,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(doors = args.doors, rounds = args.rounds, policy = ?args.strategy, seed = ?args.seed, "simulating");

    // 挑战者随机选门，主持人揭示，再按策略抉择
    let result = simulate(
        Settings::new(args.doors, args.rounds),
        args.strategy.into(),
        rng,
    )?;

    println!(
        "游戏设置: 共 {} 个门，进行了 {} 轮游戏；",
        result.doors(),
        result.rounds()
    );
    println!(
        "共赢得奖品 {} 轮，未赢得奖品 {} 轮，胜率 {:.2}%；",
        result.wins(),
        result.rounds() - result.wins(),
        result.win_rate() * 100.0
    );
    println!(
        "第一次就选择正确 {} 轮，第一次未选择正确 {} 轮，第一次选择正确率 {:.2}%；",
        result.picked_wins(),
        result.rounds() - result.picked_wins(),
        result.picked_rate() * 100.0
    );
    let keep = result.keep();
    if keep.rounds() > 0 {
        println!(
            "坚持选择 {} 轮，坚持后赢得奖品 {} 轮，坚持选择正确率 {:.2}%；",
            keep.rounds(),
            keep.wins(),
            keep.rate() * 100.0
        );
    }
    let switch = result.switch();
    if switch.rounds() > 0 {
        println!(
            "改变选择 {} 轮，改变后赢得奖品 {} 轮，改变选择正确率 {:.2}%。",
            switch.rounds(),
            switch.wins(),
            switch.rate() * 100.0
        );
    }

    Ok(())
}
