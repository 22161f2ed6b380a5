//! Raw rows to a uniform daily series.
//!
//! The steps, in order:
//! 1. sub-region rows are filtered out of shared files by place type and id
//! 2. dates are parsed with the family's column/format and rows sorted
//! 3. source values become running totals (summed when incremental, read
//!    directly when cumulative)
//! 4. missing calendar days are synthesized with the prior total carried forward
//! 5. decreases are clamped: a lower total than the day before yields a zero
//!    delta and the earlier total is kept, so the correction is absorbed by
//!    later increases. Past days are never rewritten.

use chrono::NaiveDate;
use cvd_core::{
    config::{place_type_column, FamilyConfig, ValueSemantics},
    date_range::DateRange,
    RawRow, RegionInfo, TimeseriesRow,
};

/// A dated source row with its parsed (possibly missing) values.
#[derive(Debug, Clone, Copy)]
struct Observation {
    date: NaiveDate,
    cases: Option<f64>,
    deaths: Option<f64>,
}

/// Normalize a region's raw rows. Empty input, or input with no usable rows,
/// yields an empty series.
pub fn normalize(raw: &[RawRow], info: &RegionInfo, family: &FamilyConfig) -> Vec<TimeseriesRow> {
    let rows: Vec<&RawRow> = if info.is_country {
        raw.iter().collect()
    } else {
        raw.iter().filter(|row| belongs_to(row, info)).collect()
    };

    let observations = parse_observations(&rows, family, info);
    if observations.is_empty() {
        return Vec::new();
    }

    let totals = running_totals(&observations, family.semantics);
    fill_and_clamp(&totals)
}

/// Whether a row from a shared file describes this sub-region.
fn belongs_to(row: &RawRow, info: &RegionInfo) -> bool {
    let Some(row_place_type) = row.get("place_type") else {
        // File dedicated to this region.
        return true;
    };
    if let Some(expected) = info.place_type.as_deref() {
        if expected != row_place_type {
            return false;
        }
    }
    place_type_column(row_place_type)
        .and_then(|column| row.get(column))
        .map(|value| value == info.id)
        .unwrap_or(false)
}

fn parse_observations(rows: &[&RawRow], family: &FamilyConfig, info: &RegionInfo) -> Vec<Observation> {
    let mut skipped = 0u32;
    let mut observations: Vec<Observation> = rows
        .iter()
        .filter_map(|row| {
            let date = row
                .get(&family.date_column)
                .and_then(|s| NaiveDate::parse_from_str(s, &family.date_format).ok());
            match date {
                Some(date) => Some(Observation {
                    date,
                    cases: row.number(&family.cases_column),
                    deaths: row.number(&family.deaths_column),
                }),
                None => {
                    skipped += 1;
                    None
                }
            }
        })
        .collect();
    if skipped > 0 {
        log::warn!(
            "{}: skipped {} rows without a readable {} ({})",
            info.key,
            skipped,
            family.date_column,
            family.date_format
        );
    }

    observations.sort_by_key(|o| o.date);
    merge_same_day(observations, family.semantics)
}

/// Collapse rows sharing a date: increments add up, totals keep the largest.
fn merge_same_day(observations: Vec<Observation>, semantics: ValueSemantics) -> Vec<Observation> {
    let combine = |a: Option<f64>, b: Option<f64>| match (a, b) {
        (Some(a), Some(b)) => Some(match semantics {
            ValueSemantics::Incremental => a + b,
            ValueSemantics::Cumulative => a.max(b),
        }),
        (a, b) => a.or(b),
    };
    let mut merged: Vec<Observation> = Vec::with_capacity(observations.len());
    for o in observations {
        match merged.last_mut() {
            Some(last) if last.date == o.date => {
                last.cases = combine(last.cases, o.cases);
                last.deaths = combine(last.deaths, o.deaths);
            }
            _ => merged.push(o),
        }
    }
    merged
}

/// Source totals per observed date. Missing values count as zero new cases
/// (incremental) or as no change (cumulative).
fn running_totals(observations: &[Observation], semantics: ValueSemantics) -> Vec<(NaiveDate, f64, f64)> {
    let mut cases = 0.0;
    let mut deaths = 0.0;
    observations
        .iter()
        .map(|o| {
            match semantics {
                ValueSemantics::Incremental => {
                    cases += o.cases.unwrap_or(0.0);
                    deaths += o.deaths.unwrap_or(0.0);
                }
                ValueSemantics::Cumulative => {
                    cases = o.cases.unwrap_or(cases);
                    deaths = o.deaths.unwrap_or(deaths);
                }
            }
            (o.date, cases, deaths)
        })
        .collect()
}

fn fill_and_clamp(totals: &[(NaiveDate, f64, f64)]) -> Vec<TimeseriesRow> {
    let mut result: Vec<TimeseriesRow> = Vec::with_capacity(totals.len());
    let mut confirmed = 0.0_f64;
    let mut deaths = 0.0_f64;
    let mut clamped = 0u32;

    for &(date, total_cases, total_deaths) in totals {
        if let Some(prev) = result.last() {
            for missing in DateRange::between(prev.date, date) {
                result.push(TimeseriesRow {
                    date: missing,
                    confirmed,
                    confirmed_daily: 0.0,
                    deaths,
                    deaths_daily: 0.0,
                });
            }
        }

        if total_cases < confirmed || total_deaths < deaths {
            clamped += 1;
        }
        let next_confirmed = confirmed.max(total_cases);
        let next_deaths = deaths.max(total_deaths);
        result.push(TimeseriesRow {
            date,
            confirmed: next_confirmed,
            confirmed_daily: next_confirmed - confirmed,
            deaths: next_deaths,
            deaths_daily: next_deaths - deaths,
        });
        confirmed = next_confirmed;
        deaths = next_deaths;
    }

    if clamped > 0 {
        log::debug!("clamped {} negative corrections", clamped);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvd_core::{config::RegionConfigTable, RegionKey};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::from_pairs(pairs.iter().copied())
    }

    fn country(key: &str) -> RegionInfo {
        RegionInfo::fallback(&RegionKey::from(key))
    }

    fn dd_mm_cumulative() -> FamilyConfig {
        FamilyConfig {
            date_column: "date".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            cases_column: "cases".to_string(),
            deaths_column: "deaths".to_string(),
            semantics: ValueSemantics::Cumulative,
        }
    }

    #[test]
    fn synthesizes_missing_day_with_carried_total() {
        let raw = vec![
            row(&[("date", "01/01/2021"), ("cases", "100")]),
            row(&[("date", "03/01/2021"), ("cases", "150")]),
        ];
        let series = normalize(&raw, &country("X"), &dd_mm_cumulative());
        assert_eq!(series.len(), 3);

        assert_eq!(series[0].date, ymd(2021, 1, 1));
        assert_eq!(series[0].confirmed, 100.0);
        // zero baseline before the first observation
        assert_eq!(series[0].confirmed_daily, 100.0);

        assert_eq!(series[1].date, ymd(2021, 1, 2));
        assert_eq!(series[1].confirmed, 100.0);
        assert_eq!(series[1].confirmed_daily, 0.0);

        assert_eq!(series[2].date, ymd(2021, 1, 3));
        assert_eq!(series[2].confirmed, 150.0);
        assert_eq!(series[2].confirmed_daily, 50.0);
    }

    #[test]
    fn output_has_one_row_per_day() {
        let raw = vec![
            row(&[("date", "10/02/2021"), ("cases", "30")]),
            row(&[("date", "01/02/2021"), ("cases", "10")]),
            row(&[("date", "05/02/2021"), ("cases", "20")]),
        ];
        let series = normalize(&raw, &country("X"), &dd_mm_cumulative());
        assert_eq!(series.len(), 10);
        for pair in series.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 1);
        }
    }

    #[test]
    fn negative_deltas_are_clamped_and_absorbed() {
        let raw = vec![
            row(&[("date", "01/01/2021"), ("cases", "100"), ("deaths", "5")]),
            row(&[("date", "02/01/2021"), ("cases", "90"), ("deaths", "4")]),
            row(&[("date", "03/01/2021"), ("cases", "120"), ("deaths", "6")]),
        ];
        let series = normalize(&raw, &country("X"), &dd_mm_cumulative());
        assert!(series.iter().all(|r| r.confirmed_daily >= 0.0 && r.deaths_daily >= 0.0));
        assert_eq!(series[1].confirmed, 100.0);
        assert_eq!(series[1].confirmed_daily, 0.0);
        assert_eq!(series[2].confirmed_daily, 20.0);
        assert_eq!(series[2].deaths_daily, 1.0);
        // earlier days untouched
        assert_eq!(series[0].confirmed, 100.0);
    }

    #[test]
    fn daily_values_sum_to_cumulative() {
        let raw = vec![
            row(&[("date", "01/01/2021"), ("cases", "3")]),
            row(&[("date", "02/01/2021"), ("cases", "10")]),
            row(&[("date", "04/01/2021"), ("cases", "8")]),
            row(&[("date", "07/01/2021"), ("cases", "25")]),
        ];
        let series = normalize(&raw, &country("X"), &dd_mm_cumulative());
        let mut sum = 0.0;
        for r in &series {
            sum += r.confirmed_daily;
            assert_eq!(sum, r.confirmed);
        }
    }

    #[test]
    fn incremental_country_rows_are_summed() {
        // ECDC files list the most recent day first.
        let raw = vec![
            row(&[("dateRep", "03/04/2020"), ("cases", "7"), ("deaths", "1")]),
            row(&[("dateRep", "02/04/2020"), ("cases", "-2"), ("deaths", "0")]),
            row(&[("dateRep", "01/04/2020"), ("cases", "5"), ("deaths", "")]),
        ];
        let info = country("Sweden");
        let family = RegionConfigTable::builtin().family_for(&info);
        let series = normalize(&raw, &info, &family);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].confirmed, 5.0);
        assert_eq!(series[1].confirmed, 5.0);
        assert_eq!(series[1].confirmed_daily, 0.0);
        assert_eq!(series[2].confirmed, 10.0);
        assert_eq!(series[2].confirmed_daily, 5.0);
        assert_eq!(series[2].deaths, 1.0);
    }

    #[test]
    fn subregion_rows_filtered_from_shared_file() {
        let raw = vec![
            row(&[("date", "2020-05-01"), ("place_type", "state"), ("state", "RS"), ("confirmed", "10")]),
            row(&[("date", "2020-05-01"), ("place_type", "state"), ("state", "SP"), ("confirmed", "99")]),
            row(&[("date", "2020-05-01"), ("place_type", "city"), ("state", "RS"), ("city", "Porto Alegre"), ("confirmed", "4")]),
            row(&[("date", "2020-05-02"), ("place_type", "state"), ("state", "RS"), ("confirmed", "12")]),
        ];
        let mut info = RegionInfo::fallback(&RegionKey::from("Brazil.regions.RS"));
        info.place_type = Some("state".to_string());
        let family = RegionConfigTable::builtin().family_for(&info);
        let series = normalize(&raw, &info, &family);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].confirmed, 10.0);
        assert_eq!(series[1].confirmed_daily, 2.0);
    }

    #[test]
    fn malformed_values_never_fail() {
        let raw = vec![
            row(&[("date", "01/01/2021"), ("cases", "10")]),
            row(&[("date", "not a date"), ("cases", "99")]),
            row(&[("date", "02/01/2021"), ("cases", "oops")]),
        ];
        let series = normalize(&raw, &country("X"), &dd_mm_cumulative());
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].confirmed, 10.0);
        assert_eq!(series[1].confirmed_daily, 0.0);
    }

    #[test]
    fn empty_input_is_empty_series() {
        assert!(normalize(&[], &country("X"), &dd_mm_cumulative()).is_empty());
    }
}
