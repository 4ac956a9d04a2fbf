use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::engine::league::normalize_league;
use crate::types::{History, MatchRecord, PlayCategory, TotalsDirection};

/// `(a/b)` anywhere in the history field.
static HISTORY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)/(\d+)\)").unwrap());

/// How row fields are located in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Comma-split positional fields:
    /// League, Time(Pacific), Time(Eastern), Player1, Player2, Play, History.
    DelimitedLine,
    /// First non-blank line is a header; columns are located by label and
    /// may appear in any order. Falls back to the positional layout when
    /// the header is missing a required label.
    StructuredRow,
}

/// Column positions for one batch. The positional layout doubles as the
/// fallback when a structured header cannot be resolved.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    league: usize,
    pacific: usize,
    eastern: usize,
    player1: usize,
    player2: usize,
    play: usize,
    history: usize,
}

impl ColumnMap {
    fn positional() -> Self {
        Self { league: 0, pacific: 1, eastern: 2, player1: 3, player2: 4, play: 5, history: 6 }
    }

    fn required_len(&self) -> usize {
        [
            self.league,
            self.pacific,
            self.eastern,
            self.player1,
            self.player2,
            self.play,
            self.history,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Resolve column positions from a header row. Labels are matched
    /// case-insensitively by substring; the play column is the one that
    /// says "play" without being a player column.
    fn from_header(fields: &[&str]) -> Option<Self> {
        let lower: Vec<String> = fields.iter().map(|f| f.trim().to_lowercase()).collect();

        let find = |label: &str| lower.iter().position(|f| f.contains(label));
        let league = find("league")?;
        let pacific = find("pacific")?;
        let eastern = find("eastern")?;
        let history = find("history")?;

        let mut players = lower
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains("player"))
            .map(|(i, _)| i);
        let player1 = players.next()?;
        let player2 = players.next()?;

        let play = lower
            .iter()
            .position(|f| f.contains("play") && !f.contains("player"))?;

        Some(Self { league, pacific, eastern, player1, player2, play, history })
    }
}

/// Parse one input batch into MatchRecords, in input order.
///
/// Blank lines and header-looking lines (containing the literal column
/// label "League") are skipped; malformed rows are dropped without
/// surfacing an error — only observable as an absence from the output.
pub fn parse_rows(raw: &str, format: RowFormat) -> Vec<MatchRecord> {
    let mut columns = ColumnMap::positional();
    let mut header_resolved = false;
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains("League") {
            if format == RowFormat::StructuredRow && !header_resolved {
                let fields: Vec<&str> = line.split(',').collect();
                if let Some(mapped) = ColumnMap::from_header(&fields) {
                    columns = mapped;
                }
                header_resolved = true;
            }
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        match parse_row(&fields, &columns) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = records.len(), "[PARSE] dropped malformed rows");
    }
    records
}

fn parse_row(fields: &[&str], columns: &ColumnMap) -> Option<MatchRecord> {
    if fields.len() < columns.required_len() {
        return None;
    }

    let play_label = fields[columns.play].trim().to_string();
    let play = parse_play(&play_label)?;
    let (wins, sample_size) = parse_history(fields[columns.history], play)?;

    Some(MatchRecord {
        league: normalize_league(fields[columns.league]),
        player_a: fields[columns.player1].trim().to_string(),
        player_b: fields[columns.player2].trim().to_string(),
        time_eastern: strip_date(fields[columns.eastern]),
        time_pacific: strip_date(fields[columns.pacific]),
        play,
        play_label,
        history: History { wins, sample_size },
    })
}

/// Case-insensitive substring match on the play-type text. Anything that
/// names none of the known play types rejects the row.
fn parse_play(label: &str) -> Option<PlayCategory> {
    let upper = label.to_uppercase();
    if upper.contains("4+") {
        return Some(PlayCategory::FourPlusSet);
    }
    if upper.contains("OVER") {
        return Some(PlayCategory::Totals(TotalsDirection::Over));
    }
    if upper.contains("UNDER") {
        return Some(PlayCategory::Totals(TotalsDirection::Under));
    }
    None
}

/// Extract `(a/b)` and apply category polarity.
///
/// For 4+ plays the raw fraction counts *non-qualifying* occurrences, so
/// the win count is `b - a`; for totals the fraction is used as-is. The
/// asymmetry is intentional and must not be normalized away.
///
/// Rejected: no parenthesized fraction, `b == 0`, or `a > b` (no legal
/// win count under either polarity).
fn parse_history(field: &str, play: PlayCategory) -> Option<(u32, u32)> {
    let caps = HISTORY_RE.captures(field)?;
    let a: u32 = caps[1].parse().ok()?;
    let b: u32 = caps[2].parse().ok()?;
    if b == 0 || a > b {
        return None;
    }
    let wins = match play {
        PlayCategory::FourPlusSet => b - a,
        PlayCategory::Totals(_) => a,
    };
    Some((wins, b))
}

/// Time fields arrive as `<date> <time> <meridiem>`; drop the leading
/// date token and keep the rest. A field with no internal whitespace
/// passes through unchanged.
fn strip_date(field: &str) -> String {
    let trimmed = field.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim_start().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW_4PLUS: &str = "ELITE,02/20 8:00 AM,02/20 11:00 AM,Smith,Jones,4+ SETS,(10/50)";
    const ROW_OVER: &str = "Setka Cup,02/20 9:00 AM,02/20 12:00 PM,Lee,Park,OVER 74.5,(28/30)";

    #[test]
    fn parses_a_four_plus_row_with_inverted_polarity() {
        let records = parse_rows(ROW_4PLUS, RowFormat::DelimitedLine);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.league, "ELITE");
        assert_eq!(r.player_a, "Smith");
        assert_eq!(r.player_b, "Jones");
        assert_eq!(r.time_eastern, "11:00 AM");
        assert_eq!(r.time_pacific, "8:00 AM");
        assert_eq!(r.play, PlayCategory::FourPlusSet);
        // (10/50) counts non-qualifying occurrences: wins = 50 - 10.
        assert_eq!(r.history, History { wins: 40, sample_size: 50 });
    }

    #[test]
    fn parses_a_totals_row_with_fraction_as_is() {
        let records = parse_rows(ROW_OVER, RowFormat::DelimitedLine);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.league, "SETKA");
        assert_eq!(r.play, PlayCategory::Totals(TotalsDirection::Over));
        assert_eq!(r.play_label, "OVER 74.5");
        assert_eq!(r.history, History { wins: 28, sample_size: 30 });
    }

    #[test]
    fn under_play_is_matched_case_insensitively() {
        let row = "CZECH,02/20 8:00 AM,02/20 11:00 AM,A,B,under 72.5,(5/20)";
        let records = parse_rows(row, RowFormat::DelimitedLine);
        assert_eq!(records[0].play, PlayCategory::Totals(TotalsDirection::Under));
        assert_eq!(records[0].history.wins, 5);
    }

    #[test]
    fn header_and_blank_lines_are_skipped() {
        let input = format!("League,Time(Pacific),Time(Eastern),Player1,Player2,Play,History\n\n{ROW_4PLUS}");
        let records = parse_rows(&input, RowFormat::DelimitedLine);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn short_row_is_dropped() {
        let records = parse_rows("ELITE,8:00 AM,11:00 AM,Smith,Jones,(10/50)", RowFormat::DelimitedLine);
        assert!(records.is_empty());
    }

    #[test]
    fn unknown_play_type_is_dropped() {
        let row = "ELITE,02/20 8:00 AM,02/20 11:00 AM,Smith,Jones,MONEYLINE,(10/50)";
        assert!(parse_rows(row, RowFormat::DelimitedLine).is_empty());
    }

    #[test]
    fn missing_or_malformed_history_is_dropped() {
        for history in ["", "10/50", "(x/50)", "(10-50)"] {
            let row = format!("ELITE,02/20 8:00 AM,02/20 11:00 AM,Smith,Jones,4+ SETS,{history}");
            assert!(
                parse_rows(&row, RowFormat::DelimitedLine).is_empty(),
                "history {history:?} should reject the row"
            );
        }
    }

    #[test]
    fn zero_sample_size_is_dropped_at_parse_time() {
        let row = "ELITE,02/20 8:00 AM,02/20 11:00 AM,Smith,Jones,4+ SETS,(0/0)";
        assert!(parse_rows(row, RowFormat::DelimitedLine).is_empty());
    }

    #[test]
    fn fraction_exceeding_sample_is_dropped() {
        let row = "ELITE,02/20 8:00 AM,02/20 11:00 AM,Smith,Jones,4+ SETS,(51/50)";
        assert!(parse_rows(row, RowFormat::DelimitedLine).is_empty());
    }

    #[test]
    fn time_without_internal_space_passes_through() {
        let row = "ELITE,8:00AM,11:00AM,Smith,Jones,4+ SETS,(10/50)";
        let records = parse_rows(row, RowFormat::DelimitedLine);
        assert_eq!(records[0].time_pacific, "8:00AM");
        assert_eq!(records[0].time_eastern, "11:00AM");
    }

    #[test]
    fn structured_header_maps_shuffled_columns() {
        let input = "\
History,Player1,Player2,League,Play,Time(Eastern),Time(Pacific)
(28/30),Lee,Park,Setka Cup,OVER 74.5,02/20 12:00 PM,02/20 9:00 AM";
        let records = parse_rows(input, RowFormat::StructuredRow);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.league, "SETKA");
        assert_eq!(r.player_a, "Lee");
        assert_eq!(r.time_eastern, "12:00 PM");
        assert_eq!(r.time_pacific, "9:00 AM");
        assert_eq!(r.history, History { wins: 28, sample_size: 30 });
    }

    #[test]
    fn structured_header_missing_labels_falls_back_to_positional() {
        let input = format!("League,col,col,col,col,col,col\n{ROW_4PLUS}");
        let records = parse_rows(&input, RowFormat::StructuredRow);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].league, "ELITE");
    }

    #[test]
    fn fractions_parse_for_both_polarities() {
        for (a, b) in [(0u32, 1u32), (3, 7), (50, 50)] {
            let totals = format!("ELITE,x 1 AM,x 4 AM,A,B,OVER 1.5,({a}/{b})");
            let records = parse_rows(&totals, RowFormat::DelimitedLine);
            assert_eq!(records[0].history, History { wins: a, sample_size: b });

            let four = format!("ELITE,x 1 AM,x 4 AM,A,B,4+ SETS,({a}/{b})");
            let records = parse_rows(&four, RowFormat::DelimitedLine);
            assert_eq!(records[0].history, History { wins: b - a, sample_size: b });
        }
    }
}
