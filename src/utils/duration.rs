// Duration parsing for flow-clock values

use anyhow::Result;

/// Parse a duration expression and return milliseconds
///
/// Accepts a bare number of milliseconds (`3600`) or unit-suffixed parts in
/// any combination: `800ms`, `1.5s`, `2m`, `1m30s`.
pub fn parse_duration_ms(expr: &str) -> Result<u64> {
    let expr = expr.trim();
    if expr.is_empty() {
        anyhow::bail!("Duration cannot be empty");
    }

    // Bare number: already milliseconds
    if let Ok(ms) = expr.parse::<u64>() {
        return Ok(ms);
    }

    let mut total_ms = 0f64;
    let mut remaining = expr;

    while !remaining.is_empty() {
        let split = remaining
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(remaining.len());
        let (number, rest) = remaining.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration format: {}", expr))?;

        // "ms" has to be tried before "m"
        let (factor, unit_len) = if rest.starts_with("ms") {
            (1.0, 2)
        } else if rest.starts_with('s') {
            (1000.0, 1)
        } else if rest.starts_with('m') {
            (60_000.0, 1)
        } else if rest.starts_with('h') {
            (3_600_000.0, 1)
        } else {
            anyhow::bail!("Invalid duration format: {}", expr);
        };

        total_ms += value * factor;
        remaining = &rest[unit_len..];
    }

    Ok(total_ms.round() as u64)
}

/// Render milliseconds the way the flow panel shows elapsed time
pub fn format_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
