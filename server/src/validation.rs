use crate::error::AppError;
use crate::models::league::Perks;

pub const REGION_CHOICES: &[&str] = &["EU", "NA", "ASIA", "SA"];
pub const GAMEMODE_CHOICES: &[&str] = &["Swift Game", "War Game"];
pub const MATCHTYPE_CHOICES: &[&str] = &["4v4", "3v3", "2v2", "1v1"];
pub const PERKS_CHOICES: &[&str] = &["Enabled", "Disabled"];
const MAX_PRIVATE_LINK_LEN: usize = 512;
const MAX_REASON_LEN: usize = 512;
const MAX_RANK_NAME_LEN: usize = 64;
const DEFAULT_RANK_COLOR: &str = "#808080";

fn one_of(value: &str, choices: &[&str], what: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .map(|c| c.to_string())
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid {}: {}", what, value)))
}

pub fn validate_region(region: &str) -> Result<String, AppError> {
    one_of(region, REGION_CHOICES, "region")
}

pub fn validate_game_mode(mode: &str) -> Result<String, AppError> {
    one_of(mode, GAMEMODE_CHOICES, "game mode")
}

pub fn validate_match_type(match_type: &str) -> Result<String, AppError> {
    one_of(match_type, MATCHTYPE_CHOICES, "match type")
}

pub fn validate_perks(perks: &str) -> Result<Perks, AppError> {
    match one_of(perks, PERKS_CHOICES, "perks setting")?.as_str() {
        "Enabled" => Ok(Perks::Enabled),
        _ => Ok(Perks::Disabled),
    }
}

pub fn validate_private_link(link: Option<String>) -> Result<Option<String>, AppError> {
    match link.map(|l| l.trim().to_string()) {
        None => Ok(None),
        Some(l) if l.is_empty() => Ok(None),
        Some(l) if l.len() > MAX_PRIVATE_LINK_LEN => {
            Err(AppError::InvalidInput("Private link too long".into()))
        }
        Some(l) => Ok(Some(l)),
    }
}

pub fn validate_reason(reason: Option<&str>) -> String {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => r.chars().take(MAX_REASON_LEN).collect(),
        _ => "No reason provided".to_string(),
    }
}

pub fn validate_rank_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Rank name cannot be empty".into()));
    }
    Ok(trimmed.chars().take(MAX_RANK_NAME_LEN).collect())
}

pub fn validate_rank_level(level: i64) -> Result<(), AppError> {
    if level < 0 {
        Err(AppError::InvalidInput("Rank level cannot be negative".into()))
    } else {
        Ok(())
    }
}

/// Normalizes a hex color to `#RRGGBB`, defaulting to grey.
pub fn validate_color(color: Option<&str>) -> Result<String, AppError> {
    let raw = match color.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_RANK_COLOR.to_string()),
        Some(c) => c,
    };
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        Err(AppError::InvalidInput(format!("Invalid color: {}", raw)))
    }
}

/// Parses `<number><s|m|h|d>` into seconds.
pub fn parse_duration(duration: &str) -> Result<u64, AppError> {
    let invalid = || {
        AppError::InvalidInput(format!(
            "Invalid duration '{}', use <number>s/m/h/d (e.g. 30m)",
            duration
        ))
    };
    let trimmed = duration.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return Err(invalid()),
    };
    let amount: u64 = trimmed[..trimmed.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    match amount.checked_mul(multiplier) {
        Some(0) | None => Err(invalid()),
        Some(secs) => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_are_case_insensitive_and_canonicalized() {
        assert_eq!(validate_region("eu").unwrap(), "EU");
        assert_eq!(validate_game_mode("war game").unwrap(), "War Game");
        assert_eq!(validate_match_type("2V2").unwrap(), "2v2");
        assert!(validate_region("Mars").is_err());
        assert!(validate_match_type("5v5").is_err());
        assert_eq!(validate_perks("disabled").unwrap(), Perks::Disabled);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("30m").unwrap(), 1800);
        assert_eq!(parse_duration("3h").unwrap(), 10800);
        assert_eq!(parse_duration("2d").unwrap(), 172800);
        assert_eq!(parse_duration("45s").unwrap(), 45);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("tenm").is_err());
    }

    #[test]
    fn colors() {
        assert_eq!(validate_color(Some("ffd700")).unwrap(), "#FFD700");
        assert_eq!(validate_color(Some("#c0c0c0")).unwrap(), "#C0C0C0");
        assert_eq!(validate_color(None).unwrap(), "#808080");
        assert!(validate_color(Some("gold")).is_err());
    }

    #[test]
    fn reasons_default_when_blank() {
        assert_eq!(validate_reason(None), "No reason provided");
        assert_eq!(validate_reason(Some("  ")), "No reason provided");
        assert_eq!(validate_reason(Some(" spam ")), "spam");
    }
}
