use crate::{Engine, Result, RoundResult, Strategy};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 模拟设置
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Settings {
    /// 门数
    pub doors: u32,

    /// 轮数
    pub rounds: u32,
}

impl Settings {
    pub fn new(doors: u32, rounds: u32) -> Self {
        Self { doors, rounds }
    }
}

/// 模拟挑战者的抉择方式
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Policy {
    /// 每轮使用同一策略
    Fixed(Strategy),

    /// 每轮随机决定坚持或改变
    Random,
}

/// 某一种抉择下的轮数与赢的轮数
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, Eq, PartialEq)]
pub struct Tally {
    rounds: u64,
    wins: u64,
}

impl Tally {
    fn record(&mut self, win: bool) {
        self.rounds += 1;
        if win {
            self.wins += 1;
        }
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn rate(&self) -> f64 {
        ratio(self.wins, self.rounds)
    }
}

/// 逐轮累计的统计结果，内存占用与轮数无关
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Eq, PartialEq)]
pub struct Summary {
    doors: u32,
    /// 全部轮次
    overall: Tally,
    /// 第一次就选中奖品的轮数
    picked_wins: u64,
    /// 主持人留下有奖的门的轮数
    left_wins: u64,
    keep: Tally,
    switch: Tally,
}

impl Summary {
    pub fn new(doors: u32) -> Self {
        Self {
            doors,
            overall: Tally::default(),
            picked_wins: 0,
            left_wins: 0,
            keep: Tally::default(),
            switch: Tally::default(),
        }
    }

    /// 计入一轮结果
    pub fn add(&mut self, result: &RoundResult) {
        self.overall.record(result.win());
        if result.picked() == result.winner() {
            self.picked_wins += 1;
        }
        if result.left() == result.winner() {
            self.left_wins += 1;
        }
        match result.decision() {
            Strategy::Keep => self.keep.record(result.win()),
            Strategy::Switch => self.switch.record(result.win()),
        }
    }

    pub fn calculate<'a, I>(doors: u32, results: I) -> Self
    where
        I: IntoIterator<Item = &'a RoundResult>,
    {
        let mut summary = Self::new(doors);
        for result in results {
            summary.add(result);
        }
        summary
    }

    pub fn doors(&self) -> u32 {
        self.doors
    }

    pub fn rounds(&self) -> u64 {
        self.overall.rounds
    }

    pub fn wins(&self) -> u64 {
        self.overall.wins
    }

    pub fn picked_wins(&self) -> u64 {
        self.picked_wins
    }

    pub fn left_wins(&self) -> u64 {
        self.left_wins
    }

    /// 坚持选择的轮次
    pub fn keep(&self) -> Tally {
        self.keep
    }

    /// 改变选择的轮次
    pub fn switch(&self) -> Tally {
        self.switch
    }

    pub fn win_rate(&self) -> f64 {
        self.overall.rate()
    }

    /// 第一次就选中奖品的比例
    pub fn picked_rate(&self) -> f64 {
        ratio(self.picked_wins, self.overall.rounds)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// 连续模拟多轮游戏：挑战者随机选门，再按 `policy` 做出抉择
pub fn simulate<R: Rng>(settings: Settings, policy: Policy, rng: R) -> Result<Summary> {
    let mut engine = Engine::with_rng(settings.doors, rng)?;
    let mut summary = Summary::new(settings.doors);

    for _ in 0..settings.rounds {
        engine.select_random()?;
        let strategy = match policy {
            Policy::Fixed(strategy) => strategy,
            Policy::Random => engine.sample(),
        };
        summary.add(&engine.resolve_with(strategy)?);
        engine.retry()?;
    }

    Ok(summary)
}
