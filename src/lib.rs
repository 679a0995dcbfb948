mod autoplay;
mod error;
mod summary;

pub use autoplay::*;
pub use error::*;
pub use summary::*;

use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 最少门数：揭示之后除了挑战者选的门，至少还要留一个门关着
pub const MIN_DOORS: u32 = 3;

/// 最多门数
pub const MAX_DOORS: u32 = 1000;

/// 门
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Door {
    /// 门序号，从 1 开始
    id: u32,

    /// 奖品在此门内
    is_winning: bool,

    /// 已经打开
    is_open: bool,

    /// 挑战者当前选中此门
    is_selected: bool,
}

impl Door {
    fn closed(id: u32, is_winning: bool) -> Self {
        Self {
            id,
            is_winning,
            is_open: false,
            is_selected: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_winning(&self) -> bool {
        self.is_winning
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }
}

/// 一轮游戏的各个阶段
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// 等待挑战者选择
    AwaitingSelection,

    /// 主持人已揭示，等待挑战者抉择
    AwaitingFinalDecision,

    /// 本轮结束
    Resolved,
}

impl Default for Phase {
    fn default() -> Self {
        Self::AwaitingSelection
    }
}

/// 一轮游戏
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Round {
    /// 按显示顺序排列的门
    doors: Vec<Door>,

    /// 当前阶段
    phase: Phase,
}

impl Round {
    /// 创建一轮游戏并将奖品随机放到一个门内
    fn random<R: Rng + ?Sized>(doors: u32, rng: &mut R) -> Result<Self> {
        check_door_count(doors)?;
        let winner = rng.gen_range(1..=doors);
        Self::with_winner(doors, winner)
    }

    /// 创建一轮游戏并将奖品放到序号指定的门内
    fn with_winner(doors: u32, winner: u32) -> Result<Self> {
        check_door_count(doors)?;
        if winner == 0 || winner > doors {
            return Err(Error::UnknownDoor { door: winner });
        }
        Ok(Self {
            doors: (1..=doors).map(|id| Door::closed(id, id == winner)).collect(),
            phase: Phase::AwaitingSelection,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn door_count(&self) -> u32 {
        self.doors.len() as u32
    }

    pub fn door(&self, id: u32) -> Option<&Door> {
        self.index_of(id).ok().map(|index| &self.doors[index])
    }

    /// 有奖品的门
    pub fn winner(&self) -> Option<&Door> {
        self.doors.iter().find(|door| door.is_winning)
    }

    /// 挑战者当前选中的门
    pub fn selected(&self) -> Option<&Door> {
        self.doors.iter().find(|door| door.is_selected)
    }

    /// 主持人揭示后留给挑战者的另一扇门，只在等待抉择阶段存在
    pub fn switch_target(&self) -> Option<&Door> {
        if self.phase != Phase::AwaitingFinalDecision {
            return None;
        }
        self.doors
            .iter()
            .find(|door| !door.is_open && !door.is_selected)
    }

    // 门序号从 1 开始连续编号
    fn index_of(&self, id: u32) -> Result<usize> {
        if id >= 1 && id <= self.door_count() {
            Ok(id as usize - 1)
        } else {
            Err(Error::UnknownDoor { door: id })
        }
    }
}

fn check_door_count(doors: u32) -> Result<()> {
    if (MIN_DOORS..=MAX_DOORS).contains(&doors) {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration { doors })
    }
}

/// 累计得分
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Default, Eq, PartialEq)]
pub struct Score {
    /// 已结束的轮数
    attempts: u32,

    /// 最终选中奖品的轮数
    wins: u32,
}

impl Score {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn win_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.wins as f64 / self.attempts as f64
        }
    }
}

/// 挑战者策略
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Strategy {
    /// 坚持选择
    Keep,

    /// 改变选择
    Switch,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Keep
    }
}

impl Distribution<Strategy> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Strategy {
        if rng.gen() {
            Strategy::Switch
        } else {
            Strategy::Keep
        }
    }
}

impl Strategy {
    /// 按策略给出最终要选的门
    pub fn final_door(&self, round: &Round) -> Option<u32> {
        match self {
            Strategy::Keep => round
                .switch_target()
                .and_then(|_| round.selected())
                .map(Door::id),
            Strategy::Switch => round.switch_target().map(Door::id),
        }
    }
}

/// 一轮游戏的结果
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct RoundResult {
    /// 奖品所在门序号
    winner: u32,

    /// 挑战者最初选择的门序号
    picked: u32,

    /// 主持人揭示后剩下的门序号
    left: u32,

    /// 挑战者的抉择
    decision: Strategy,

    /// 是否赢得奖品
    win: bool,
}

impl RoundResult {
    pub fn winner(&self) -> u32 {
        self.winner
    }

    pub fn picked(&self) -> u32 {
        self.picked
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn decision(&self) -> Strategy {
        self.decision
    }

    pub fn win(&self) -> bool {
        self.win
    }

    /// 最终选中的门序号
    pub fn final_door(&self) -> u32 {
        match self.decision {
            Strategy::Keep => self.picked,
            Strategy::Switch => self.left,
        }
    }
}

/// 提供给界面渲染的只读快照
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Snapshot {
    pub round: Round,
    pub score: Score,
}

/// 游戏引擎，持有当前一轮游戏与累计得分
#[derive(Debug)]
pub struct Engine<R = StdRng> {
    round: Round,
    score: Score,
    rng: R,
}

impl Engine<StdRng> {
    /// 使用系统熵初始化随机源
    pub fn new(doors: u32) -> Result<Self> {
        Self::with_rng(doors, StdRng::from_entropy())
    }
}

impl<R: Rng> Engine<R> {
    /// 使用指定随机源
    pub fn with_rng(doors: u32, mut rng: R) -> Result<Self> {
        let round = Round::random(doors, &mut rng)?;
        Ok(Self {
            round,
            score: Score::default(),
            rng,
        })
    }

    /// 当前一轮游戏
    pub fn round(&self) -> &Round {
        &self.round
    }

    /// 累计得分
    pub fn score(&self) -> Score {
        self.score
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            round: self.round.clone(),
            score: self.score,
        }
    }

    /// 从引擎的随机源采样
    pub fn sample<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.rng.gen()
    }

    /// 开始新一轮并将奖品随机放到一个门内，得分不变
    pub fn new_round(&mut self, doors: u32) -> Result<&Round> {
        self.round = Round::random(doors, &mut self.rng)?;
        Ok(&self.round)
    }

    /// 开始新一轮并将奖品放到序号指定的门内
    pub fn new_round_with_winner(&mut self, doors: u32, winner: u32) -> Result<&Round> {
        self.round = Round::with_winner(doors, winner)?;
        Ok(&self.round)
    }

    /// 用相同门数重新开始一轮
    pub fn retry(&mut self) -> Result<&Round> {
        self.new_round(self.round.door_count())
    }

    /// 挑战者随机选择一扇关着的门
    pub fn select_random(&mut self) -> Result<u32> {
        if self.round.phase != Phase::AwaitingSelection {
            return Err(Error::InvalidState);
        }
        let closed: Vec<u32> = self
            .round
            .doors
            .iter()
            .filter(|door| !door.is_open)
            .map(Door::id)
            .collect();
        let chosen = *closed.choose(&mut self.rng).ok_or(Error::InvalidState)?;
        self.select_door(chosen)?;
        Ok(chosen)
    }

    /// 挑战者做出选择，主持人随即打开除一扇之外的其他门
    pub fn select_door(&mut self, id: u32) -> Result<&Round> {
        if self.round.phase != Phase::AwaitingSelection {
            return Err(Error::InvalidState);
        }
        let index = self.round.index_of(id)?;
        let chosen = self.round.doors[index];
        if chosen.is_open {
            return Err(Error::InvalidState);
        }

        // 挑战者没选中奖品时只能留下有奖的门，否则在其余门中随机留一扇
        let candidates: Vec<u32> = self
            .round
            .doors
            .iter()
            .filter(|door| door.id != id && !door.is_open)
            .filter(|door| chosen.is_winning || door.is_winning)
            .map(Door::id)
            .collect();
        let left = *candidates.choose(&mut self.rng).ok_or(Error::InvalidState)?;

        for door in self.round.doors.iter_mut() {
            if door.id == id {
                door.is_selected = true;
            } else if door.id != left {
                door.is_open = true;
            }
        }
        self.round.phase = Phase::AwaitingFinalDecision;
        Ok(&self.round)
    }

    /// 挑战者做出最终抉择：坚持原来的门或换到剩下的那扇门
    pub fn resolve(&mut self, id: u32) -> Result<RoundResult> {
        if self.round.phase != Phase::AwaitingFinalDecision {
            return Err(Error::InvalidState);
        }
        let index = self.round.index_of(id)?;
        let picked = self.round.selected().map(Door::id);
        let left = self.round.switch_target().map(Door::id);
        let (picked, left) = picked.zip(left).ok_or(Error::InvalidState)?;
        let decision = if id == picked {
            Strategy::Keep
        } else if id == left {
            Strategy::Switch
        } else {
            return Err(Error::InvalidChoice { door: id });
        };
        let winner = self.round.winner().map(Door::id).ok_or(Error::InvalidState)?;

        for door in self.round.doors.iter_mut() {
            door.is_selected = door.id == id;
            door.is_open = true;
        }
        self.round.phase = Phase::Resolved;

        let win = self.round.doors[index].is_winning;
        self.score.attempts += 1;
        if win {
            self.score.wins += 1;
        }

        Ok(RoundResult {
            winner,
            picked,
            left,
            decision,
            win,
        })
    }

    /// 按策略做出最终抉择
    pub fn resolve_with(&mut self, strategy: Strategy) -> Result<RoundResult> {
        let id = strategy
            .final_door(&self.round)
            .ok_or(Error::InvalidState)?;
        self.resolve(id)
    }

    /// 清零得分，当前一轮不受影响
    pub fn reset_score(&mut self) -> Score {
        self.score = Score::default();
        self.score
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn seeded(doors: u32, seed: u64) -> Engine {
        Engine::with_rng(doors, StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn new_round_has_one_winner() {
        for doors in 3..=10 {
            for seed in 0..50 {
                let engine = seeded(doors, seed);
                let round = engine.round();
                assert_eq!(round.phase(), Phase::AwaitingSelection);
                assert_eq!(round.door_count(), doors);
                assert_eq!(round.doors().iter().filter(|d| d.is_winning()).count(), 1);
                assert!(round.doors().iter().all(|d| !d.is_open() && !d.is_selected()));
                let ids: Vec<u32> = round.doors().iter().map(Door::id).collect();
                assert_eq!(ids, (1..=doors).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn too_few_doors() {
        assert_eq!(
            Engine::new(2).unwrap_err(),
            Error::InvalidConfiguration { doors: 2 }
        );

        let mut engine = seeded(3, 1);
        let before = engine.round().clone();
        assert_eq!(
            engine.new_round(1).unwrap_err(),
            Error::InvalidConfiguration { doors: 1 }
        );
        assert_eq!(engine.round(), &before);
    }

    #[test]
    fn too_many_doors() {
        assert_eq!(
            Engine::new(MAX_DOORS + 1).unwrap_err(),
            Error::InvalidConfiguration {
                doors: MAX_DOORS + 1
            }
        );

        let mut engine = seeded(3, 2);
        let before = engine.round().clone();
        assert_eq!(
            engine.new_round(u32::MAX).unwrap_err(),
            Error::InvalidConfiguration { doors: u32::MAX }
        );
        assert_eq!(
            engine.new_round_with_winner(u32::MAX, 1).unwrap_err(),
            Error::InvalidConfiguration { doors: u32::MAX }
        );
        assert_eq!(engine.round(), &before);

        assert_eq!(engine.new_round(MAX_DOORS).unwrap().door_count(), MAX_DOORS);
    }

    #[test]
    fn winner_out_of_range() {
        let mut engine = seeded(3, 1);
        assert_eq!(
            engine.new_round_with_winner(3, 4).unwrap_err(),
            Error::UnknownDoor { door: 4 }
        );
        assert_eq!(
            engine.new_round_with_winner(3, 0).unwrap_err(),
            Error::UnknownDoor { door: 0 }
        );
    }

    #[test]
    fn select_leaves_one_other_door_closed() {
        for doors in 3..=8 {
            for seed in 0..40 {
                let mut engine = seeded(doors, seed);
                let chosen = seed as u32 % doors + 1;
                let round = engine.select_door(chosen).unwrap();

                assert_eq!(round.phase(), Phase::AwaitingFinalDecision);
                let door = round.door(chosen).unwrap();
                assert!(door.is_selected() && !door.is_open());
                let closed_others = round
                    .doors()
                    .iter()
                    .filter(|d| d.id() != chosen && !d.is_open())
                    .count();
                assert_eq!(closed_others, 1);
                assert_eq!(round.doors().iter().filter(|d| d.is_selected()).count(), 1);
                // 主持人永远不会打开有奖的门
                assert!(round.doors().iter().all(|d| !(d.is_open() && d.is_winning())));
            }
        }
    }

    #[test]
    fn select_errors_leave_round_untouched() {
        let mut engine = seeded(4, 7);
        let before = engine.round().clone();
        assert_eq!(
            engine.select_door(5).unwrap_err(),
            Error::UnknownDoor { door: 5 }
        );
        assert_eq!(engine.round(), &before);

        engine.select_door(2).unwrap();
        let before = engine.round().clone();
        assert_eq!(engine.select_door(1).unwrap_err(), Error::InvalidState);
        assert_eq!(engine.select_random().unwrap_err(), Error::InvalidState);
        assert_eq!(engine.round(), &before);
    }

    #[test]
    fn resolve_rejects_other_doors() {
        let mut engine = seeded(5, 3);
        assert_eq!(engine.resolve(1).unwrap_err(), Error::InvalidState);

        engine.select_door(3).unwrap();
        let before = engine.round().clone();
        let left = before.switch_target().unwrap().id();
        for id in 1..=5 {
            if id == 3 || id == left {
                continue;
            }
            assert_eq!(
                engine.resolve(id).unwrap_err(),
                Error::InvalidChoice { door: id }
            );
        }
        assert_eq!(
            engine.resolve(9).unwrap_err(),
            Error::UnknownDoor { door: 9 }
        );
        assert_eq!(engine.round(), &before);
        assert_eq!(engine.score(), Score::default());
    }

    #[test]
    fn switch_to_winner() {
        let mut engine = seeded(3, 0);
        engine.new_round_with_winner(3, 2).unwrap();

        let round = engine.select_door(1).unwrap();
        assert!(round.door(3).unwrap().is_open());
        assert!(!round.door(2).unwrap().is_open());
        assert_eq!(round.switch_target().unwrap().id(), 2);

        let result = engine.resolve(2).unwrap();
        assert_eq!(result.decision(), Strategy::Switch);
        assert!(result.win());
        assert_eq!(result.final_door(), 2);

        let round = engine.round();
        assert_eq!(round.phase(), Phase::Resolved);
        assert!(round.doors().iter().all(Door::is_open));
        assert_eq!(round.selected().unwrap().id(), 2);
        assert_eq!(engine.score().attempts(), 1);
        assert_eq!(engine.score().wins(), 1);
    }

    #[test]
    fn picked_winner_keep_or_switch() {
        for seed in 0..20 {
            let mut keep = seeded(3, seed);
            keep.new_round_with_winner(3, 1).unwrap();
            let round = keep.select_door(1).unwrap();
            let opened: Vec<u32> = round
                .doors()
                .iter()
                .filter(|d| d.is_open())
                .map(Door::id)
                .collect();
            assert_eq!(opened.len(), 1);
            assert!(opened[0] == 2 || opened[0] == 3);
            keep.resolve(1).unwrap();
            assert_eq!(keep.score().wins(), 1);
            assert_eq!(keep.score().attempts(), 1);

            let mut switch = seeded(3, seed);
            switch.new_round_with_winner(3, 1).unwrap();
            switch.select_door(1).unwrap();
            let result = switch.resolve_with(Strategy::Switch).unwrap();
            assert!(!result.win());
            assert_eq!(switch.score().wins(), 0);
            assert_eq!(switch.score().attempts(), 1);
        }
    }

    #[test]
    fn host_choice_is_uniform() {
        let mut engine = seeded(3, 42);
        let mut left_two = 0;
        let trials = 10000;
        for _ in 0..trials {
            engine.new_round_with_winner(3, 1).unwrap();
            engine.select_door(1).unwrap();
            if engine.round().switch_target().unwrap().id() == 2 {
                left_two += 1;
            }
        }
        let ratio = left_two as f64 / trials as f64;
        assert!((ratio - 0.5).abs() < 0.03, "ratio = {ratio}");
    }

    #[test]
    fn reset_score_keeps_round() {
        let mut engine = seeded(3, 9);
        engine.select_random().unwrap();
        engine.resolve_with(Strategy::Keep).unwrap();
        engine.retry().unwrap();
        assert_eq!(engine.score().attempts(), 1);

        engine.select_door(2).unwrap();
        let before = engine.round().clone();
        assert_eq!(engine.reset_score(), Score::default());
        assert_eq!(engine.score(), Score::default());
        assert_eq!(engine.round(), &before);
    }

    #[test]
    fn score_changes_only_on_resolve() {
        let mut engine = seeded(6, 11);
        engine.select_random().unwrap();
        assert_eq!(engine.score(), Score::default());
        engine.resolve_with(Strategy::Switch).unwrap();
        assert_eq!(engine.score().attempts(), 1);
        assert_eq!(engine.resolve(1).unwrap_err(), Error::InvalidState);
        engine.retry().unwrap();
        engine.new_round(4).unwrap();
        assert_eq!(engine.score().attempts(), 1);
        assert_eq!(engine.round().door_count(), 4);
    }

    #[test]
    fn strategy_final_door() {
        let mut engine = seeded(3, 5);
        engine.new_round_with_winner(3, 3).unwrap();
        assert_eq!(Strategy::Keep.final_door(engine.round()), None);
        engine.select_door(1).unwrap();
        assert_eq!(Strategy::Keep.final_door(engine.round()), Some(1));
        assert_eq!(Strategy::Switch.final_door(engine.round()), Some(3));
    }
}
