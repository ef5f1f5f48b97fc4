/// Split seconds into whole hours, minutes and seconds
fn split_hms(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, seconds % 3600 / 60, seconds % 60)
}

/// Format seconds as `HH:MM:SS`. Hours are not wrapped, so 100h renders as `100:00:00`.
pub fn secs_to_hms(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);
    format!("{h:02}:{m:02}:{s:02}")
}

/// Format seconds as `1h 2m 3s`, omitting zero components. Zero renders as `0s`.
pub fn secs_to_hms_short(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);

    let parts: Vec<String> = [(h, 'h'), (m, 'm'), (s, 's')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    match parts.is_empty() {
        true => "0s".to_string(),
        false => parts.join(" "),
    }
}

/// Parse either plain seconds (`90`) or the short form (`1h 2m 3s`, `25m`, `1m30s`).
pub fn parse_duration(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(secs);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in input.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let scale = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(scale)?)?;
        digits.clear();
    }

    // trailing digits without a unit are ambiguous
    match digits.is_empty() {
        true => Some(total),
        false => None,
    }
}
