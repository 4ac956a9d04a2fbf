use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Play classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsDirection {
    Over,
    Under,
}

impl std::fmt::Display for TotalsDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TotalsDirection::Over => "over",
            TotalsDirection::Under => "under",
        };
        write!(f, "{s}")
    }
}

/// The two play categories a slate row can land in. Everything else is
/// rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayCategory {
    /// A bet on the match reaching four or more sets.
    FourPlusSet,
    /// An over/under bet on a combined statistic.
    Totals(TotalsDirection),
}

impl std::fmt::Display for PlayCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayCategory::FourPlusSet => write!(f, "four_plus_set"),
            PlayCategory::Totals(dir) => write!(f, "totals_{dir}"),
        }
    }
}

// ---------------------------------------------------------------------------
// History fraction
// ---------------------------------------------------------------------------

/// Win/loss history extracted from the `(a/b)` notation, already adjusted
/// for category polarity: `wins` is the count of qualifying occurrences.
///
/// Invariants (enforced by the parser): `wins <= sample_size`, and
/// `sample_size > 0` for any record that reaches classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct History {
    pub wins: u32,
    pub sample_size: u32,
}

impl History {
    /// Win rate in `[0.0, 1.0]`. Returns 0.0 for an empty sample so the
    /// classification engine stays total.
    pub fn rate(&self) -> f64 {
        if self.sample_size == 0 {
            return 0.0;
        }
        self.wins as f64 / self.sample_size as f64
    }
}

// ---------------------------------------------------------------------------
// MatchRecord — the canonical parsed unit
// ---------------------------------------------------------------------------

/// One parsed slate row. Not mutated after creation; the classification
/// label is carried alongside in `ClassifiedRecord`, never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Canonical league tag, or the uppercased raw text if unmatched.
    pub league: String,
    pub player_a: String,
    pub player_b: String,
    /// Displayable time-of-day, date token already stripped.
    pub time_eastern: String,
    pub time_pacific: String,
    pub play: PlayCategory,
    /// Raw play-type text as it appeared in the row (e.g. `OVER 73.5`),
    /// used verbatim when rendering totals lines.
    pub play_label: String,
    pub history: History,
}

impl MatchRecord {
    /// Identity for dedup purposes: league + unordered player pair +
    /// displayed time-of-day. The date portion of the source is not part
    /// of the key — same-matchup rows on different days collapse.
    pub fn matchup_key(&self) -> MatchupKey {
        let (lo, hi) = if self.player_a <= self.player_b {
            (self.player_a.clone(), self.player_b.clone())
        } else {
            (self.player_b.clone(), self.player_a.clone())
        };
        MatchupKey {
            league: self.league.clone(),
            player_lo: lo,
            player_hi: hi,
            time_eastern: self.time_eastern.clone(),
            time_pacific: self.time_pacific.clone(),
        }
    }
}

/// Derived matchup identity. Two records with equal keys are "the same
/// matchup" regardless of play category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchupKey {
    pub league: String,
    pub player_lo: String,
    pub player_hi: String,
    pub time_eastern: String,
    pub time_pacific: String,
}

// ---------------------------------------------------------------------------
// Classification labels
// ---------------------------------------------------------------------------

/// Qualitative risk flag for a 4+ play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Caution,
    HighRisk,
}

impl RiskTier {
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskTier::Caution => "⚠️",
            RiskTier::HighRisk => "☢️",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskTier::Caution => "caution",
            RiskTier::HighRisk => "high_risk",
        };
        write!(f, "{s}")
    }
}

/// Recommended stake multiple (in units) for a totals play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeSize {
    U1,
    U1_25,
    U1_5,
    U1_75,
    U2,
    U2_5,
}

impl StakeSize {
    /// Display label as it appears in digest lines.
    pub fn label(&self) -> &'static str {
        match self {
            StakeSize::U1 => "1U",
            StakeSize::U1_25 => "1.25U",
            StakeSize::U1_5 => "1.5U",
            StakeSize::U1_75 => "1.75U",
            StakeSize::U2 => "2U",
            StakeSize::U2_5 => "2.5U",
        }
    }
}

impl std::fmt::Display for StakeSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category-specific label attached by the classification engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    /// 4+ plays: a risk tier, or none when no threshold rule fired.
    Risk(Option<RiskTier>),
    /// Totals plays: always a stake size (the engine is total).
    Stake(StakeSize),
}

/// A MatchRecord plus its attached label. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: MatchRecord,
    pub annotation: Annotation,
}

// ---------------------------------------------------------------------------
// Digest — the finalized output of one pipeline run
// ---------------------------------------------------------------------------

/// The two rendered digest lists. A Digest fully replaces its predecessor;
/// the identities of previously published messages live in the publisher,
/// never here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    pub four_plus_lines: Vec<String>,
    pub totals_lines: Vec<String>,
}

impl Digest {
    /// Both lists empty — a valid, normal outcome (the publisher decides
    /// whether to render a placeholder).
    pub fn is_empty(&self) -> bool {
        self.four_plus_lines.is_empty() && self.totals_lines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Chat transport types
// ---------------------------------------------------------------------------

/// Identity of a published chat message, enough to retract it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel_id: String,
    pub message_id: String,
}

/// An inbound chat message routed from the gateway to the command consumer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub author_is_bot: bool,
    /// Role ids of the author in the originating guild (empty in DMs).
    pub role_ids: Vec<String>,
    pub content: String,
    pub attachment_urls: Vec<String>,
}
