use crate::{Engine, Error, Phase, Result, RoundResult, Strategy};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// 自动挑战者默认节拍
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// 自动挑战者最短节拍，再加速的请求会被忽略
pub const MIN_INTERVAL: Duration = Duration::from_millis(3);

/// 自动挑战者运行状态
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    Idle,
    Running { interval: Duration },
}

impl Default for DriverState {
    fn default() -> Self {
        Self::Idle
    }
}

/// 自动挑战者一拍内做的事
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Step {
    /// 随机选了一扇门
    Selected { door: u32 },

    /// 按策略做出了抉择
    Resolved { result: RoundResult },

    /// 上一轮已结束，开始了新一轮
    NewRound,

    /// 引擎拒绝了操作，本拍什么也没做
    Skipped { cause: Error },
}

/// 按固定策略自动进行游戏，节拍由调用方的定时器驱动
#[derive(Debug, Default)]
pub struct Autoplay {
    strategy: Strategy,
    state: DriverState,
}

impl Autoplay {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            state: DriverState::Idle,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// 下一次进入抉择阶段时生效
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    /// 运行中的节拍
    pub fn interval(&self) -> Option<Duration> {
        match self.state {
            DriverState::Idle => None,
            DriverState::Running { interval } => Some(interval),
        }
    }

    pub fn start(&mut self, interval: Duration) -> Result<()> {
        check_interval(interval)?;
        debug!(interval_ms = interval.as_millis() as u64, "autoplay started");
        self.state = DriverState::Running { interval };
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.is_running() {
            debug!("autoplay stopped");
        }
        self.state = DriverState::Idle;
    }

    /// 修改运行中的节拍
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        check_interval(interval)?;
        match &mut self.state {
            DriverState::Running { interval: current } => {
                *current = interval;
                Ok(())
            }
            DriverState::Idle => Err(Error::InvalidState),
        }
    }

    /// 节拍减半；减半后低于最短节拍或者未运行时不做任何事
    pub fn faster(&mut self) -> Option<Duration> {
        match &mut self.state {
            DriverState::Running { interval } => {
                let halved = Duration::from_millis(interval.as_millis() as u64 / 2);
                if halved < MIN_INTERVAL {
                    return None;
                }
                *interval = halved;
                Some(halved)
            }
            DriverState::Idle => None,
        }
    }

    /// 走一拍：根据当前阶段选门、抉择或者开始新一轮
    pub fn tick<R: Rng>(&self, engine: &mut Engine<R>) -> Step {
        let step = match engine.round().phase() {
            Phase::AwaitingSelection => engine
                .select_random()
                .map(|door| Step::Selected { door }),
            Phase::AwaitingFinalDecision => engine
                .resolve_with(self.strategy)
                .map(|result| Step::Resolved { result }),
            Phase::Resolved => engine.retry().map(|_| Step::NewRound),
        };

        step.unwrap_or_else(|cause| {
            warn!(%cause, "autoplay tick skipped");
            Step::Skipped { cause }
        })
    }
}

fn check_interval(interval: Duration) -> Result<()> {
    if interval < MIN_INTERVAL {
        Err(Error::IntervalTooShort {
            interval_ms: interval.as_millis() as u64,
            min_ms: MIN_INTERVAL.as_millis() as u64,
        })
    } else {
        Ok(())
    }
}
