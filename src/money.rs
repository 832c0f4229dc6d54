//! Monetary amount parsing and formatting.
//!
//! The ledger stores amounts as integer cents. The gateway reports amounts
//! as decimal strings ("12.50"), which must round-trip without floating
//! point anywhere in between.

/// Parse a decimal amount string ("12.50", "12.5", "100", "-3.40") into cents.
///
/// Returns `None` for anything that is not a plain decimal with at most two
/// fraction digits. Gateway amounts always carry two digits; anything else
/// is treated as malformed rather than rounded.
pub fn parse_cents(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > 2 {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let int: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    // "12.5" means 50 cents, not 5
    let frac: i64 = if frac_part.is_empty() {
        0
    } else if frac_part.len() == 1 {
        frac_part.parse::<i64>().ok()? * 10
    } else {
        frac_part.parse().ok()?
    };

    let cents = int.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -cents } else { cents })
}

/// Format cents back into the gateway's decimal string form.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
