/// Tag for a blank league field — normalization always yields a
/// non-empty tag.
pub const UNKNOWN_LEAGUE: &str = "UNKNOWN";

/// Maps a free-text league label to a canonical tag.
///
/// Checked in fixed priority order, case-insensitive substring, first
/// match wins. "Setka Cup" must resolve to SETKA, so SETKA is checked
/// before CUP. No match returns the uppercased original text verbatim —
/// the fallback is itself canonical for that input, never an error.
pub fn normalize_league(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() {
        return UNKNOWN_LEAGUE.to_string();
    }
    if upper.contains("ELITE") {
        return "ELITE".to_string();
    }
    if upper.contains("SETKA") {
        return "SETKA".to_string();
    }
    if upper.contains("CUP") {
        return "CUP".to_string();
    }
    if upper.contains("CZECH") {
        return "CZECH".to_string();
    }
    upper
}
