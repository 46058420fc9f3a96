//! Fixed-point number formatting that stays off the float `Display` path.
//!
//! The same code renders panel text in the browser build, where float-to-decimal
//! formatting has produced wasm panics in some toolchain/browser combinations.
//! Finite values are scaled and rounded into an `i64`, then formatted as
//! integers. Values too large for that are whole numbers already and take
//! the float formatter.

/// Formats `v` with exactly `decimals` fractional digits.
///
/// Returns `None` for `NaN` and infinities only.
pub fn fmt_fixed(v: f64, decimals: usize) -> Option<String> {
    if !v.is_finite() {
        return None;
    }

    // Clamp decimals to something reasonable to avoid huge powers.
    let decimals = decimals.min(9);
    let scale_i64 = 10_i64.pow(decimals as u32);
    let scale_f = scale_i64 as f64;

    let scaled = (v * scale_f).round();
    if !scaled.is_finite() || scaled.abs() >= (i64::MAX as f64) {
        return Some(format!("{v:.decimals$}"));
    }

    let scaled_i = scaled as i64;
    let negative = scaled_i < 0;
    let abs_i = scaled_i.unsigned_abs();
    let scale_u = scale_i64 as u64;
    let int_part = abs_i / scale_u;
    let frac_part = abs_i % scale_u;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_part.to_string());

    if decimals > 0 {
        out.push('.');
        let frac_str = frac_part.to_string();
        // Left-pad with zeros.
        for _ in 0..decimals.saturating_sub(frac_str.len()) {
            out.push('0');
        }
        out.push_str(&frac_str);
    }

    Some(out)
}

/// Formats `v` with at most `decimals` fractional digits, dropping trailing
/// zeros (`3.0` → `"3"`, `2.50` → `"2.5"`). Non-finite values render as `NaN`.
pub fn fmt_trimmed(v: f64, decimals: usize) -> String {
    let Some(mut out) = fmt_fixed(v, decimals) else {
        return "NaN".to_string();
    };
    if out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if out == "-0" {
        out.remove(0);
    }
    out
}
