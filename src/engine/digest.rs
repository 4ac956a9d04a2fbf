use std::collections::HashSet;

use crate::types::{Annotation, ClassifiedRecord, Digest, MatchupKey, PlayCategory};

/// Accumulates classified records for one batch in input order, applying
/// per-category first-seen-wins dedup and 4+-over-totals suppression,
/// and renders admitted records to display lines.
///
/// Fresh per batch; holds no cross-invocation state.
#[derive(Debug, Default)]
pub struct DigestBuilder {
    four_plus_seen: HashSet<MatchupKey>,
    totals_seen: HashSet<MatchupKey>,
    four_plus_lines: Vec<String>,
    totals_lines: Vec<String>,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one record. Repeated matchups collapse to their first
    /// occurrence; a totals record whose matchup already produced a 4+
    /// entry is dropped entirely — a matchup flagged for a 4+ bet is not
    /// also recommended as a totals bet in the same digest.
    pub fn push(&mut self, classified: ClassifiedRecord) {
        let key = classified.record.matchup_key();
        match classified.record.play {
            PlayCategory::FourPlusSet => {
                if self.four_plus_seen.insert(key) {
                    self.four_plus_lines.push(render(&classified));
                }
            }
            PlayCategory::Totals(_) => {
                if self.four_plus_seen.contains(&key) {
                    return;
                }
                if self.totals_seen.insert(key) {
                    self.totals_lines.push(render(&classified));
                }
            }
        }
    }

    pub fn finish(self) -> Digest {
        Digest {
            four_plus_lines: self.four_plus_lines,
            totals_lines: self.totals_lines,
        }
    }
}

/// Render one admitted record to its single display line.
///
/// 4+:    `LEAGUE – A vs B @ EST EST / PST PST (w/n)[ emoji]`
/// totals: `LEAGUE – A vs B PLAY STAKE @ EST EST / PST PST (w/n)`
fn render(classified: &ClassifiedRecord) -> String {
    let r = &classified.record;
    let play_segment = match classified.annotation {
        Annotation::Risk(_) => String::new(),
        Annotation::Stake(stake) => format!(" {} {}", r.play_label, stake.label()),
    };
    let emoji_suffix = match classified.annotation {
        Annotation::Risk(Some(tier)) => format!(" {}", tier.emoji()),
        _ => String::new(),
    };
    format!(
        "{} – {} vs {}{} @ {} EST / {} PST ({}/{}){}",
        r.league,
        r.player_a,
        r.player_b,
        play_segment,
        r.time_eastern,
        r.time_pacific,
        r.history.wins,
        r.history.sample_size,
        emoji_suffix,
    )
}
