/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    if negative {
        format!("-${}.{dec_part}", group_thousands(int_part))
    } else {
        format!("${}.{dec_part}", group_thousands(int_part))
    }
}

/// Format an integer count with thousands separators: 9,994
pub fn number(val: usize) -> String {
    group_thousands(&val.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Compact dollar label for chart axes and bar captions: $950, $1.5k, $2M
pub fn format_k(val: f64) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let val = val.abs();
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}${}M", m as u64)
        } else {
            format!("{sign}${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("{sign}${}k", k as u64)
        } else {
            format!("{sign}${:.1}k", k)
        }
    } else {
        format!("{sign}${}", val.round() as u64)
    }
}

pub fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}
