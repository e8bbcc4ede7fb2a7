//! Display formatting. Values stay numeric everywhere else; these helpers
//! are only called when rendering.

pub const MISSING: &str = "n/a";

/// Group the integer digits of a plain decimal string in threes.
fn group_thousands(plain: &str) -> String {
    let (sign, rest) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `1234.567` → `1,234.57`.
pub fn number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let plain = format!("{value:.decimals$}");
    // "-0.00" reads badly next to other figures
    if plain.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        return plain.trim_start_matches('-').to_string();
    }
    group_thousands(&plain)
}

pub fn price(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| number(v, 2))
}

/// Signed percent with two decimals: `+21.00%`, `-3.50%`.
pub fn percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => {
            let body = number(v, 2);
            if body.starts_with('-') || body.trim_matches(|c| c == '0' || c == '.').is_empty() {
                format!("{body}%")
            } else {
                format!("+{body}%")
            }
        }
        None => MISSING.to_string(),
    }
}

pub fn volume(value: Option<u64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| group_thousands(&v.to_string()))
}

/// Short volume for chart axes: `1.2M`, `350K`.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}
