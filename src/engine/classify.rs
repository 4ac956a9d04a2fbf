use crate::types::{
    Annotation, ClassifiedRecord, History, MatchRecord, PlayCategory, RiskTier, StakeSize,
};

/// One stake-sizing rule: first rule whose predicate matches wins.
#[derive(Debug, Clone, Copy)]
pub struct StakeRule {
    pub matches: fn(rate: f64, sample: u32) -> bool,
    pub stake: StakeSize,
}

/// One risk-tier rule. Predicates also see the raw win count — the
/// caution band is defined on wins, not rate, for small samples.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub matches: fn(rate: f64, wins: u32, sample: u32) -> bool,
    pub tier: RiskTier,
}

/// Injected threshold configuration: ordered rule lists, first match
/// wins, explicit fallback for totals. The canonical tables below are one
/// tuning among several the engine accepts.
#[derive(Debug, Clone)]
pub struct Tables {
    pub stake_rules: Vec<StakeRule>,
    pub stake_fallback: StakeSize,
    pub risk_rules: Vec<RiskRule>,
}

impl Tables {
    /// The canonical tuning. Stake rules split into two regimes at
    /// sample >= 30, with a lower stake ceiling below the split; any
    /// retuning keeps the split, only the breakpoints move.
    pub fn canonical() -> Self {
        Self {
            stake_rules: vec![
                StakeRule { matches: |r, s| s >= 30 && r >= 0.95, stake: StakeSize::U2_5 },
                StakeRule { matches: |r, s| s >= 30 && r >= 0.91, stake: StakeSize::U2 },
                StakeRule { matches: |r, s| s >= 30 && r >= 0.86, stake: StakeSize::U1_5 },
                StakeRule { matches: |r, s| s >= 30 && r >= 0.81, stake: StakeSize::U1_25 },
                StakeRule { matches: |r, s| s < 30 && r >= 0.95, stake: StakeSize::U2 },
                StakeRule { matches: |r, s| s < 30 && r >= 0.91, stake: StakeSize::U1_75 },
                StakeRule { matches: |r, s| s < 30 && r >= 0.86, stake: StakeSize::U1_5 },
                StakeRule { matches: |r, s| s < 30 && r >= 0.81, stake: StakeSize::U1_25 },
            ],
            stake_fallback: StakeSize::U1,
            risk_rules: vec![
                RiskRule {
                    matches: |r, _, s| (r >= 0.93 && s >= 40) || (r >= 0.95 && s >= 30),
                    tier: RiskTier::HighRisk,
                },
                RiskRule {
                    matches: |r, w, s| {
                        (s <= 25 && (18..=22).contains(&w)) || (r >= 0.83 && r <= 0.89 && s >= 25)
                    },
                    tier: RiskTier::Caution,
                },
            ],
        }
    }
}

/// Stake size for a totals play. Total: an empty sample returns the
/// fallback rather than failing.
pub fn stake_size(history: &History, tables: &Tables) -> StakeSize {
    if history.sample_size == 0 {
        return tables.stake_fallback;
    }
    let rate = history.rate();
    tables
        .stake_rules
        .iter()
        .find(|rule| (rule.matches)(rate, history.sample_size))
        .map(|rule| rule.stake)
        .unwrap_or(tables.stake_fallback)
}

/// Risk tier for a 4+ play; None when no rule fires or the sample is
/// empty.
pub fn risk_tier(history: &History, tables: &Tables) -> Option<RiskTier> {
    if history.sample_size == 0 {
        return None;
    }
    let rate = history.rate();
    tables
        .risk_rules
        .iter()
        .find(|rule| (rule.matches)(rate, history.wins, history.sample_size))
        .map(|rule| rule.tier)
}

/// Attach the category-appropriate label to a parsed record.
pub fn classify(record: MatchRecord, tables: &Tables) -> ClassifiedRecord {
    let annotation = match record.play {
        PlayCategory::FourPlusSet => Annotation::Risk(risk_tier(&record.history, tables)),
        PlayCategory::Totals(_) => Annotation::Stake(stake_size(&record.history, tables)),
    };
    ClassifiedRecord { record, annotation }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stake(wins: u32, sample: u32) -> StakeSize {
        stake_size(&History { wins, sample_size: sample }, &Tables::canonical())
    }

    fn risk(wins: u32, sample: u32) -> Option<RiskTier> {
        risk_tier(&History { wins, sample_size: sample }, &Tables::canonical())
    }

    #[test]
    fn large_sample_stake_brackets() {
        assert_eq!(stake(38, 40), StakeSize::U2_5); // 0.95
        assert_eq!(stake(28, 30), StakeSize::U2); // 0.933
        assert_eq!(stake(35, 40), StakeSize::U1_5); // 0.875
        assert_eq!(stake(33, 40), StakeSize::U1_25); // 0.825
        assert_eq!(stake(32, 40), StakeSize::U1); // 0.80
    }

    #[test]
    fn small_sample_stake_brackets_cap_lower() {
        assert_eq!(stake(20, 20), StakeSize::U2); // 1.00 — not 2.5U below 30
        assert_eq!(stake(23, 25), StakeSize::U1_75); // 0.92
        assert_eq!(stake(22, 25), StakeSize::U1_5); // 0.88
        assert_eq!(stake(21, 25), StakeSize::U1_25); // 0.84
        assert_eq!(stake(20, 25), StakeSize::U1); // 0.80
    }

    #[test]
    fn regime_boundary_sits_at_sample_30() {
        // Same 0.95 rate lands differently on each side of the split.
        assert_eq!(stake(19, 20), StakeSize::U2);
        assert_eq!(stake(57, 60), StakeSize::U2_5);
    }

    #[test]
    fn empty_sample_totals_lookup_returns_lowest_stake() {
        assert_eq!(stake(0, 0), StakeSize::U1);
    }

    #[test]
    fn high_risk_requires_rate_and_sample() {
        assert_eq!(risk(38, 40), Some(RiskTier::HighRisk)); // 0.95 at sample 40
        // 0.935 clears the .93 rate gate but not its sample-40 gate, and
        // misses the .95 gate entirely.
        assert_eq!(risk(29, 31), None);
    }

    #[test]
    fn high_risk_alternate_gate() {
        // rate >= .95 with sample >= 30 also qualifies.
        assert_eq!(risk(29, 30), Some(RiskTier::HighRisk)); // 0.967
        // Just below the sample gate: neither arm fires.
        assert_eq!(risk(28, 29), None); // 0.966 but sample 29 < 30
    }

    #[test]
    fn caution_from_small_sample_win_band() {
        assert_eq!(risk(18, 25), Some(RiskTier::Caution));
        assert_eq!(risk(22, 25), Some(RiskTier::Caution));
        assert_eq!(risk(17, 25), None);
        assert_eq!(risk(23, 25), None); // 0.92 on sample 25: outside both arms
    }

    #[test]
    fn caution_from_mid_rate_band() {
        assert_eq!(risk(85, 100), Some(RiskTier::Caution)); // 0.85
        assert_eq!(risk(82, 100), None); // 0.82 below the band
        assert_eq!(risk(90, 100), None); // 0.90 above the band
    }

    #[test]
    fn high_risk_wins_over_caution() {
        // 0.93 at sample 100 is inside the high-risk arm; the rule order
        // means caution never gets consulted.
        assert_eq!(risk(93, 100), Some(RiskTier::HighRisk));
    }

    #[test]
    fn scenario_rate_point_eight_gets_no_tier() {
        assert_eq!(risk(40, 50), None);
    }

    #[test]
    fn custom_table_is_honored() {
        let tables = Tables {
            stake_rules: vec![StakeRule { matches: |r, _| r >= 0.5, stake: StakeSize::U2_5 }],
            stake_fallback: StakeSize::U1_25,
            risk_rules: vec![RiskRule { matches: |_, _, _| true, tier: RiskTier::Caution }],
        };
        assert_eq!(stake_size(&History { wins: 1, sample_size: 2 }, &tables), StakeSize::U2_5);
        assert_eq!(stake_size(&History { wins: 0, sample_size: 2 }, &tables), StakeSize::U1_25);
        assert_eq!(
            risk_tier(&History { wins: 1, sample_size: 2 }, &tables),
            Some(RiskTier::Caution)
        );
    }

    #[test]
    fn classify_attaches_the_category_label() {
        let record = MatchRecord {
            league: "ELITE".to_string(),
            player_a: "A".to_string(),
            player_b: "B".to_string(),
            time_eastern: "11:00 AM".to_string(),
            time_pacific: "8:00 AM".to_string(),
            play: PlayCategory::FourPlusSet,
            play_label: "4+ SETS".to_string(),
            history: History { wins: 40, sample_size: 50 },
        };
        let classified = classify(record, &Tables::canonical());
        assert_eq!(classified.annotation, Annotation::Risk(None));
    }
}
