use crate::stats::{DerivedStatRecord, RawStatInput};

/// Compute shooting percentages and totals. Pure; the same input always yields the same bits.
pub fn derive(raw: &RawStatInput) -> DerivedStatRecord {
    let raw = raw.with_repaired_attempts();

    let fg = raw.two_made + raw.three_made;
    let fga = raw.two_attempted + raw.three_attempted;

    let fg_pct = percentage(fg, fga);
    let two_pct = percentage(raw.two_made, raw.two_attempted);
    let three_pct = percentage(raw.three_made, raw.three_attempted);
    let ft_pct = percentage(raw.ft_made, raw.ft_attempted);
    let trb = raw.off_rebounds + raw.def_rebounds;
    let efg_pct = percentage(raw.two_made + 0.5 * raw.three_made, fga);

    DerivedStatRecord {
        raw,
        fg,
        fga,
        fg_pct,
        two_pct,
        three_pct,
        ft_pct,
        efg_pct,
        trb,
    }
}

/// `num / den * 100` at one decimal, or 0 when there were no attempts.
pub fn percentage(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        round_to(num / den * 100.0, 1)
    } else {
        0.0
    }
}

/// Round half away from zero at `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}
