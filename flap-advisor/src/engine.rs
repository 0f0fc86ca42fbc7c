//! Advisory queries against a [`CalibrationTable`].

use crate::table::{CalibrationTable, SpeedBand, SpeedRange};

/// A flap symbol and its position in the table's evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlapMatch<'a> {
    pub symbol: &'a str,
    pub index: usize,
}

/// Weight columns to read and how far between them the weight sits.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    lower: usize,
    upper: usize,
    factor: f64,
}

impl Bracket {
    fn column(i: usize) -> Self {
        Bracket { lower: i, upper: i, factor: 0.0 }
    }
}

impl CalibrationTable {
    /// Symbol for a raw lever position.
    ///
    /// Entries are scanned in table order and the first one within the
    /// tolerance window wins, even when a later entry is closer.
    pub fn symbol_for_position(&self, raw_position: i32) -> Option<FlapMatch<'_>> {
        let tolerance = i64::from(self.tolerance());
        self.flap_entries()
            .iter()
            .enumerate()
            .find(|(_, e)| (i64::from(raw_position) - i64::from(e.position)).abs() <= tolerance)
            .map(|(index, e)| FlapMatch { symbol: &e.symbol, index })
    }

    /// Optimal flap symbol for an all-up weight (kg) and indicated airspeed (km/h).
    ///
    /// Speed ranges are interpolated linearly between the two breakpoints that
    /// bracket the weight. Weights outside the calibrated span use the nearest
    /// edge column. The first band whose range contains the speed wins.
    pub fn optimal_symbol(&self, weight_kg: f64, speed_kmh: f64) -> Option<FlapMatch<'_>> {
        let bracket = weight_bracket(self.weights(), weight_kg)?;
        self.bands()
            .iter()
            .enumerate()
            .find(|(_, band)| band_matches(band, bracket, speed_kmh))
            .map(|(index, band)| FlapMatch { symbol: &band.symbol, index })
    }
}

fn weight_bracket(weights: &[f64], weight: f64) -> Option<Bracket> {
    let (&first, &last) = (weights.first()?, weights.last()?);
    if weight.is_nan() {
        return None;
    }
    if weights.len() == 1 || weight <= first {
        return Some(Bracket::column(0));
    }
    if weight >= last {
        return Some(Bracket::column(weights.len() - 1));
    }
    if let Some(i) = weights.iter().position(|&w| w == weight) {
        return Some(Bracket::column(i));
    }

    weights
        .windows(2)
        .position(|pair| weight > pair[0] && weight < pair[1])
        .map(|i| Bracket {
            lower: i,
            upper: i + 1,
            factor: (weight - weights[i]) / (weights[i + 1] - weights[i]),
        })
}

fn band_matches(band: &SpeedBand, bracket: Bracket, speed: f64) -> bool {
    let lower = band.ranges.get(bracket.lower).copied().flatten();
    let upper = band.ranges.get(bracket.upper).copied().flatten();
    match (lower, upper) {
        (Some(a), Some(b)) => interpolate(a, b, bracket.factor).contains(speed),
        (Some(r), None) | (None, Some(r)) => r.contains(speed),
        (None, None) => false,
    }
}

fn interpolate(a: SpeedRange, b: SpeedRange, factor: f64) -> SpeedRange {
    SpeedRange {
        min: a.min + factor * (b.min - a.min),
        max: a.max + factor * (b.max - a.max),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{FlapPositionEntry, SpeedBand};

    fn entry(position: i32, symbol: &str) -> FlapPositionEntry {
        FlapPositionEntry { position, symbol: symbol.to_string() }
    }

    fn positions_table(tolerance: i32, entries: Vec<FlapPositionEntry>) -> CalibrationTable {
        CalibrationTable::new(373.15, tolerance, entries, vec![390.0], vec![]).unwrap()
    }

    fn sym(m: Option<FlapMatch<'_>>) -> Option<(&str, usize)> {
        m.map(|m| (m.symbol, m.index))
    }

    // ── symbol_for_position ───────────────────────────────────────────────────

    #[test]
    fn position_within_tolerance_matches() {
        let t = CalibrationTable::builtin();
        assert_eq!(sym(t.symbol_for_position(94)), Some(("L", 0)));
        assert_eq!(sym(t.symbol_for_position(100)), Some(("L", 0)));
        assert_eq!(sym(t.symbol_for_position(250)), Some(("S1", 7)));
        assert_eq!(sym(t.symbol_for_position(252)), Some(("S1", 7)));
        assert_eq!(sym(t.symbol_for_position(167)), Some(("+2", 1)));
        assert_eq!(sym(t.symbol_for_position(0)), None);
    }

    #[test]
    fn position_first_match_wins_over_closer_entry() {
        // 101 is 7 from 94 (outside) and 1 from 100; the earlier entry at 96 is
        // 5 away and therefore wins despite being farther.
        let t = positions_table(6, vec![entry(94, "L"), entry(96, "X"), entry(100, "Y")]);
        assert_eq!(sym(t.symbol_for_position(101)), Some(("X", 1)));

        let t = positions_table(6, vec![entry(94, "L")]);
        assert_eq!(sym(t.symbol_for_position(94)), Some(("L", 0)));
        assert_eq!(sym(t.symbol_for_position(101)), None);
    }

    #[test]
    fn builtin_overlap_resolves_to_table_order() {
        // 90 is within 6 of both "L" (94) and "0" (84); "L" comes first.
        let t = CalibrationTable::builtin();
        assert_eq!(sym(t.symbol_for_position(90)), Some(("L", 0)));
        assert_eq!(sym(t.symbol_for_position(85)), Some(("0", 3)));
    }

    #[test]
    fn widening_tolerance_never_loses_a_match() {
        let entries = vec![entry(94, "L"), entry(167, "+2"), entry(84, "0"), entry(250, "S1")];
        for raw in -10..300 {
            let mut matched = false;
            for tolerance in 0..20 {
                let t = positions_table(tolerance, entries.clone());
                let now = t.symbol_for_position(raw).is_some();
                assert!(!(matched && !now), "raw {raw} lost its match at tolerance {tolerance}");
                matched = now;
            }
        }
    }

    #[test]
    fn extreme_positions_do_not_overflow() {
        let t = positions_table(6, vec![entry(i32::MAX, "hi")]);
        assert_eq!(sym(t.symbol_for_position(i32::MIN)), None);
        assert_eq!(sym(t.symbol_for_position(i32::MAX - 3)), Some(("hi", 0)));
    }

    // ── optimal_symbol ────────────────────────────────────────────────────────

    #[test]
    fn reference_scenarios() {
        let t = CalibrationTable::builtin();
        let cases = [
            (390.0, 70.0, "L", 0),
            (390.0, 85.0, "+1", 2),
            (430.0, 81.0, "+2", 1),
            (600.0, 100.0, "+1", 2),
            (410.0, 78.0, "L", 0),
            (410.0, 79.0, "+2", 1),
            (500.0, 130.0, "0", 3),
            (580.0, 270.0, "S1", 7),
            (580.0, 70.0, "L", 0),
        ];
        for (w, v, expected, index) in cases {
            assert_eq!(
                sym(t.optimal_symbol(w, v)),
                Some((expected, index)),
                "weight {w} kg, speed {v} km/h"
            );
        }
    }

    #[test]
    fn no_band_matches_above_top_edge() {
        let t = CalibrationTable::builtin();
        assert_eq!(t.optimal_symbol(450.0, 300.0), None);
        assert_eq!(t.optimal_symbol(450.0, -5.0), None);
        assert_eq!(t.optimal_symbol(f64::NAN, 100.0), None);
        assert_eq!(t.optimal_symbol(450.0, f64::NAN), None);
    }

    #[test]
    fn weights_outside_span_clamp_to_edge_columns() {
        let t = CalibrationTable::builtin();
        for v in (0..=290).step_by(3) {
            let v = f64::from(v);
            for below in [1.0, 200.0, 389.9] {
                assert_eq!(t.optimal_symbol(below, v), t.optimal_symbol(390.0, v), "{below} kg @ {v}");
            }
            for above in [600.1, 750.0, 10_000.0] {
                assert_eq!(t.optimal_symbol(above, v), t.optimal_symbol(600.0, v), "{above} kg @ {v}");
            }
        }
    }

    #[test]
    fn breakpoint_weight_agrees_with_interpolation_endpoints() {
        let t = CalibrationTable::builtin();
        let w = t.weights();
        for v in (0..=290).map(f64::from) {
            for (i, &weight) in w.iter().enumerate() {
                let exact = t.optimal_symbol(weight, v).map(|m| m.index);
                let column = Bracket::column(i);
                let via_column = t.bands().iter().position(|b| band_matches(b, column, v));
                assert_eq!(exact, via_column);

                if i + 1 < w.len() {
                    let f0 = Bracket { lower: i, upper: i + 1, factor: 0.0 };
                    let via_f0 = t.bands().iter().position(|b| band_matches(b, f0, v));
                    assert_eq!(exact, via_f0, "factor 0 at {weight} kg, {v} km/h");
                }
                if i > 0 {
                    let f1 = Bracket { lower: i - 1, upper: i, factor: 1.0 };
                    let via_f1 = t.bands().iter().position(|b| band_matches(b, f1, v));
                    assert_eq!(exact, via_f1, "factor 1 at {weight} kg, {v} km/h");
                }
            }
        }
    }

    #[test]
    fn single_breakpoint_table_uses_its_only_column() {
        let bands = vec![
            SpeedBand { symbol: "L".into(), ranges: vec![Some(SpeedRange::new(0.0, 80.0))] },
            SpeedBand { symbol: "0".into(), ranges: vec![Some(SpeedRange::new(80.0, 150.0))] },
        ];
        let t = CalibrationTable::new(300.0, 6, vec![], vec![450.0], bands).unwrap();
        assert_eq!(sym(t.optimal_symbol(300.0, 70.0)), Some(("L", 0)));
        assert_eq!(sym(t.optimal_symbol(900.0, 120.0)), Some(("0", 1)));
    }

    #[test]
    fn partially_applicable_band_tests_present_column_directly() {
        // "W" only exists at the heavy breakpoint.
        let bands = vec![
            SpeedBand { symbol: "W".into(), ranges: vec![None, Some(SpeedRange::new(100.0, 110.0))] },
            SpeedBand { symbol: "N".into(), ranges: vec![None, None] },
            SpeedBand {
                symbol: "0".into(),
                ranges: vec![Some(SpeedRange::new(0.0, 200.0)), Some(SpeedRange::new(0.0, 200.0))],
            },
        ];
        let t = CalibrationTable::new(300.0, 6, vec![], vec![400.0, 500.0], bands).unwrap();

        // Mid-span: "W" is tested against its heavy range without interpolation.
        assert_eq!(sym(t.optimal_symbol(450.0, 105.0)), Some(("W", 0)));
        assert_eq!(sym(t.optimal_symbol(450.0, 95.0)), Some(("0", 2)));
        // At the light edge "W" has no data and cannot match.
        assert_eq!(sym(t.optimal_symbol(400.0, 105.0)), Some(("0", 2)));
    }

    #[test]
    fn interpolation_is_linear_between_columns() {
        let bands = vec![SpeedBand {
            symbol: "+1".into(),
            ranges: vec![Some(SpeedRange::new(80.0, 90.0)), Some(SpeedRange::new(100.0, 110.0))],
        }];
        let t = CalibrationTable::new(300.0, 6, vec![], vec![400.0, 500.0], bands).unwrap();
        // Quarter way: 85..95
        assert!(t.optimal_symbol(425.0, 84.9).is_none());
        assert!(t.optimal_symbol(425.0, 85.0).is_some());
        assert!(t.optimal_symbol(425.0, 95.0).is_some());
        assert!(t.optimal_symbol(425.0, 95.1).is_none());
    }

    #[test]
    fn bracket_selection() {
        let w = [390.0, 430.0, 550.0, 600.0];
        assert_eq!(weight_bracket(&w, 100.0), Some(Bracket::column(0)));
        assert_eq!(weight_bracket(&w, 700.0), Some(Bracket::column(3)));
        assert_eq!(weight_bracket(&w, 550.0), Some(Bracket::column(2)));
        assert_eq!(
            weight_bracket(&w, 410.0),
            Some(Bracket { lower: 0, upper: 1, factor: 0.5 })
        );
        assert_eq!(weight_bracket(&[], 410.0), None);
    }
}
