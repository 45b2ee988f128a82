//! Synthetic play-outcome model.
//!
//! A fast proxy for the dice-table resolver: outcome distributions are
//! derived from substrings of the offense/defense card labels ("PASS",
//! "BLITZ", ...). Every random draw goes through [`UniformSource`] so a run
//! is fully determined by the stream that feeds it.
//!
//! Draw order per play: u1, u2 (yards), turnover, clock bucket,
//! out-of-bounds, penalty gate, penalty pick (only when the gate trips).

use std::f64::consts::PI;

use rand::{Rng, RngCore};

/// Source of uniform draws in `[0, 1)`.
pub trait UniformSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: RngCore> UniformSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Returns the same value forever. Used to replay worked examples.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource(pub f64);

impl UniformSource for ConstantSource {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Cycles through a fixed list of draws.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl UniformSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

pub const TURNOVER_PROBABILITY: f64 = 0.12;
pub const PENALTY_PROBABILITY: f64 = 0.125;
pub const PERIMETER_OOB_PROBABILITY: f64 = 0.15;
pub const DEFAULT_OOB_PROBABILITY: f64 = 0.05;
pub const MIN_YARDS: f64 = -10.0;
pub const MAX_YARDS: f64 = 80.0;
pub const EXPLOSIVE_YARDS: i32 = 20;
pub const SACK_YARDS: i32 = -5;

const PERIMETER_KEYWORDS: [&str; 4] = ["BUBBLE", "SWING", "JET", "TOSS"];

/// Play family inferred from an offense card label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayType {
    Pass,
    Run,
    Other,
}

impl PlayType {
    pub fn from_card(card: &str) -> Self {
        let label = card.to_ascii_uppercase();
        if label.contains("PASS") || label.contains("AIR") || label.contains("VERT") {
            PlayType::Pass
        } else if label.contains("RUN") || label.contains("ZONE") {
            PlayType::Run
        } else {
            PlayType::Other
        }
    }
}

/// Normal-distribution parameters for yards gained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YardParams {
    pub mean: f64,
    pub std_dev: f64,
}

impl YardParams {
    pub fn for_cards(offense_card: &str, defense_card: &str) -> Self {
        let (mut mean, mut std_dev) = match PlayType::from_card(offense_card) {
            PlayType::Pass => (7.5, 12.0),
            PlayType::Run => (4.2, 3.8),
            PlayType::Other => (5.8, 8.5),
        };
        let defense = defense_card.to_ascii_uppercase();
        if defense.contains("BLITZ") {
            mean *= 0.85;
            std_dev *= 1.1;
        }
        if defense.contains("COVER") {
            mean *= 0.95;
        }
        Self { mean, std_dev }
    }
}

/// Half-up rounding: `-0.5` rounds to `0`, `2.5` to `3`.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Box-Muller draw, clamped to the field and rounded to whole yards.
pub fn sample_yards<S: UniformSource + ?Sized>(params: YardParams, rng: &mut S) -> i32 {
    // ln(0) would poison the whole sample
    let u1 = rng.next_f64().max(f64::MIN_POSITIVE);
    let u2 = rng.next_f64();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    round_half_up((params.mean + params.std_dev * z0).clamp(MIN_YARDS, MAX_YARDS)) as i32
}

/// Clock bucket weights in fixed key order.
pub fn clock_weights(play_type: PlayType, yards: i32) -> [(u32, f64); 3] {
    if play_type == PlayType::Pass || yards > 15 {
        [(10, 0.45), (20, 0.35), (30, 0.20)]
    } else if play_type == PlayType::Run {
        [(10, 0.15), (20, 0.30), (30, 0.55)]
    } else {
        [(10, 0.25), (20, 0.35), (30, 0.40)]
    }
}

/// First bucket whose cumulative weight reaches `r`; 30 if none does.
pub fn pick_clock_bucket(weights: &[(u32, f64)], r: f64) -> u32 {
    let mut cumulative = 0.0;
    for &(bucket, weight) in weights {
        cumulative += weight;
        if cumulative >= r {
            return bucket;
        }
    }
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltySide {
    Offense,
    Defense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyArchetype {
    pub name: &'static str,
    pub side: PenaltySide,
    /// Signed yardage from the offense's point of view
    pub yards: i32,
    pub automatic_first_down: bool,
}

pub static PENALTY_ARCHETYPES: [PenaltyArchetype; 9] = [
    PenaltyArchetype {
        name: "Personal Foul",
        side: PenaltySide::Offense,
        yards: -15,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Unsportsmanlike Conduct",
        side: PenaltySide::Offense,
        yards: -15,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Offensive Holding",
        side: PenaltySide::Offense,
        yards: -10,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "False Start",
        side: PenaltySide::Offense,
        yards: -5,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Offside",
        side: PenaltySide::Defense,
        yards: 5,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Neutral Zone Infraction",
        side: PenaltySide::Defense,
        yards: 5,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Illegal Use of Hands",
        side: PenaltySide::Defense,
        yards: 10,
        automatic_first_down: false,
    },
    PenaltyArchetype {
        name: "Defensive Holding",
        side: PenaltySide::Defense,
        yards: 10,
        automatic_first_down: true,
    },
    PenaltyArchetype {
        name: "Roughing the Passer",
        side: PenaltySide::Defense,
        yards: 15,
        automatic_first_down: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayTag {
    Interception,
    Fumble,
    Explosive,
    Sack,
    Incomplete,
    Pressure,
    Pass,
    Run,
}

/// One sampled play.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySample {
    pub yards: i32,
    pub turnover: bool,
    pub clock_seconds: u32,
    pub out_of_bounds: bool,
    pub tags: Vec<PlayTag>,
    pub penalty: Option<&'static PenaltyArchetype>,
}

impl PlaySample {
    pub fn has_tag(&self, tag: PlayTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Outcome model for one offense/defense card pairing.
#[derive(Debug, Clone, Copy)]
pub struct PlayModel {
    play_type: PlayType,
    perimeter: bool,
    blitz: bool,
    params: YardParams,
}

impl PlayModel {
    pub fn new(offense_card: &str, defense_card: &str) -> Self {
        let offense = offense_card.to_ascii_uppercase();
        Self {
            play_type: PlayType::from_card(offense_card),
            perimeter: PERIMETER_KEYWORDS.iter().any(|k| offense.contains(k)),
            blitz: defense_card.to_ascii_uppercase().contains("BLITZ"),
            params: YardParams::for_cards(offense_card, defense_card),
        }
    }

    pub fn play_type(&self) -> PlayType {
        self.play_type
    }

    pub fn params(&self) -> YardParams {
        self.params
    }

    pub fn sample<S: UniformSource + ?Sized>(&self, rng: &mut S) -> PlaySample {
        let is_pass = self.play_type == PlayType::Pass;

        let yards = sample_yards(self.params, rng);
        let turnover = rng.next_f64() < TURNOVER_PROBABILITY;
        let clock_seconds =
            pick_clock_bucket(&clock_weights(self.play_type, yards), rng.next_f64());
        let oob_probability = if self.perimeter {
            PERIMETER_OOB_PROBABILITY
        } else {
            DEFAULT_OOB_PROBABILITY
        };
        let out_of_bounds = rng.next_f64() < oob_probability;

        let mut tags = Vec::new();
        if turnover {
            tags.push(if is_pass {
                PlayTag::Interception
            } else {
                PlayTag::Fumble
            });
        }
        if yards >= EXPLOSIVE_YARDS {
            tags.push(PlayTag::Explosive);
        }
        if is_pass && yards <= SACK_YARDS {
            tags.push(PlayTag::Sack);
        }
        if is_pass && yards == 0 {
            tags.push(PlayTag::Incomplete);
        }
        if self.blitz {
            tags.push(PlayTag::Pressure);
        }
        tags.push(if is_pass { PlayTag::Pass } else { PlayTag::Run });

        let penalty = if rng.next_f64() < PENALTY_PROBABILITY {
            let index = (rng.next_f64() * PENALTY_ARCHETYPES.len() as f64) as usize;
            Some(&PENALTY_ARCHETYPES[index.min(PENALTY_ARCHETYPES.len() - 1)])
        } else {
            None
        };

        PlaySample {
            yards,
            turnover,
            clock_seconds,
            out_of_bounds,
            tags,
            penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_card_classification() {
        assert_eq!(PlayType::from_card("QUICK_PASS"), PlayType::Pass);
        assert_eq!(PlayType::from_card("Four Verts"), PlayType::Pass);
        assert_eq!(PlayType::from_card("AIR_RAID_MESH"), PlayType::Pass);
        assert_eq!(PlayType::from_card("inside_zone"), PlayType::Run);
        assert_eq!(PlayType::from_card("POWER_RUN"), PlayType::Run);
        assert_eq!(PlayType::from_card("PLAY_ACTION_BOOT"), PlayType::Other);
    }

    #[test]
    fn test_defense_modifiers() {
        let base = YardParams::for_cards("POWER_RUN", "BASE_4_3");
        assert_eq!(base, YardParams { mean: 4.2, std_dev: 3.8 });

        let blitz = YardParams::for_cards("POWER_RUN", "ZONE_BLITZ");
        assert!((blitz.mean - 4.2 * 0.85).abs() < 1e-12);
        assert!((blitz.std_dev - 3.8 * 1.1).abs() < 1e-12);

        let cover = YardParams::for_cards("QUICK_PASS", "COVER_2");
        assert!((cover.mean - 7.5 * 0.95).abs() < 1e-12);
        assert_eq!(cover.std_dev, 12.0);
    }

    #[test]
    fn test_box_muller_worked_example() {
        // z0 = sqrt(-2 ln 0.5) * cos(pi) = -1.1774; 4.2 - 3.8 * 1.1774 = -0.274 -> 0
        let params = YardParams::for_cards("POWER_RUN", "BASE_4_3");
        let yards = sample_yards(params, &mut ConstantSource(0.5));
        assert_eq!(yards, 0);
    }

    #[test]
    fn test_yards_are_clamped_to_field() {
        // u1 tiny, u2 = 0: z0 is about +37, far beyond the 80-yard cap
        let params = YardParams::for_cards("DEEP_PASS", "BASE");
        let mut rng = ScriptedSource::new(vec![1e-300, 0.0]);
        assert_eq!(sample_yards(params, &mut rng), 80);

        let mut rng = ScriptedSource::new(vec![1e-300, 0.5]);
        assert_eq!(sample_yards(params, &mut rng), -10);
    }

    #[test]
    fn test_zero_uniform_does_not_produce_nan() {
        let params = YardParams::for_cards("DEEP_PASS", "BASE");
        let yards = sample_yards(params, &mut ConstantSource(0.0));
        assert!((-10..=80).contains(&yards));
    }

    #[test]
    fn test_clock_bucket_worked_example() {
        let weights = clock_weights(PlayType::Run, 4);
        assert_eq!(weights, [(10, 0.15), (20, 0.30), (30, 0.55)]);
        assert_eq!(pick_clock_bucket(&weights, 0.5), 30);
        assert_eq!(pick_clock_bucket(&weights, 0.1), 10);
        assert_eq!(pick_clock_bucket(&weights, 0.44), 20);
        assert_eq!(pick_clock_bucket(&weights, 0.3), 20);
        // 0.15 + 0.30 accumulates to 0.44999999999999996, so an r exactly on
        // the boundary falls through to the next bucket
        assert_eq!(pick_clock_bucket(&weights, 0.45), 30);
    }

    #[test]
    fn test_clock_weights_switch_on_long_gain() {
        assert_eq!(clock_weights(PlayType::Run, 16)[0], (10, 0.45));
        assert_eq!(clock_weights(PlayType::Other, 3)[2], (30, 0.40));
        // Cumulative sum falls short of r: fallback bucket
        assert_eq!(pick_clock_bucket(&[(10, 0.2), (20, 0.2)], 0.9), 30);
    }

    #[test]
    fn test_constant_half_run_play() {
        let model = PlayModel::new("POWER_RUN", "BASE_4_3");
        let play = model.sample(&mut ConstantSource(0.5));

        assert_eq!(play.yards, 0);
        assert_eq!(play.clock_seconds, 30);
        assert!(!play.turnover);
        assert!(!play.out_of_bounds);
        assert!(play.penalty.is_none());
        assert_eq!(play.tags, vec![PlayTag::Run]);
    }

    #[test]
    fn test_pass_tags() {
        let model = PlayModel::new("QUICK_PASS", "SLOT_BLITZ");
        // yards 6, turnover (0.05 < 0.12), clock 20, in bounds, penalty pick 8
        let mut rng = ScriptedSource::new(vec![
            0.5,
            0.25, // cos(pi/2) = 0 -> yards = round(mean) > 0
            0.05,
            0.5,
            0.9,
            0.01,
            0.99,
        ]);
        let play = model.sample(&mut rng);
        assert!(play.turnover);
        assert!(play.has_tag(PlayTag::Interception));
        assert!(play.has_tag(PlayTag::Pressure));
        assert!(play.has_tag(PlayTag::Pass));
        assert_eq!(play.penalty.map(|p| p.name), Some("Roughing the Passer"));
    }

    #[test]
    fn test_penalty_archetypes() {
        let offense: Vec<i32> = PENALTY_ARCHETYPES
            .iter()
            .filter(|p| p.side == PenaltySide::Offense)
            .map(|p| p.yards)
            .collect();
        assert_eq!(offense, vec![-15, -15, -10, -5]);
        let auto_first = PENALTY_ARCHETYPES
            .iter()
            .filter(|p| p.automatic_first_down)
            .count();
        assert_eq!(auto_first, 2);
    }

    #[test]
    fn test_seeded_stream_is_reproducible() {
        let model = PlayModel::new("SCREEN_PASS", "COVER_3");
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(model.sample(&mut a), model.sample(&mut b));
        }
    }
}
