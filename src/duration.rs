//! Compact ISO-8601 duration parsing for video lengths (`PT1H2M3S`).

/// Videos shorter than this are treated as shorts and never stored.
pub const SHORTS_FLOOR_SECS: u32 = 60;

/// Parses a `PT[nH][nM][nS]` duration code into whole seconds.
///
/// Every component is optional and must appear in H, M, S order at most once.
/// Anything else yields `0`, which callers treat as "unknown".
pub fn parse_duration(code: &str) -> u32 {
    let Some(rest) = code.trim().strip_prefix("PT") else {
        return 0;
    };

    let mut total: u64 = 0;
    let mut current = String::new();
    // Index into "HMS" of the last designator seen, to reject repeats and bad ordering
    let mut last_unit: Option<usize> = None;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            current.push(c);
            continue;
        }

        let unit = match "HMS".find(c) {
            Some(unit) => unit,
            None => return 0,
        };
        if current.is_empty() || last_unit.is_some_and(|last| unit <= last) {
            return 0;
        }
        let value: u64 = match current.parse() {
            Ok(value) => value,
            Err(_) => return 0,
        };
        let Some(next) = value
            .checked_mul([3600, 60, 1][unit])
            .and_then(|secs| total.checked_add(secs))
        else {
            return 0;
        };
        total = next;
        last_unit = Some(unit);
        current.clear();
    }

    if !current.is_empty() {
        return 0;
    }

    u32::try_from(total).unwrap_or(u32::MAX)
}

/// True when the video is long enough to be kept.
pub fn passes_shorts_filter(duration_secs: u32, floor_secs: u32) -> bool {
    duration_secs != 0 && duration_secs >= floor_secs
}
