//! Descriptive statistics over a user's health records for a time period.
//!
//! The aggregator is pure: callers pass the records and the current time.
//! Only present values are counted; a field with no values reports `null`.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

use crate::models::{HealthRecord, TimeOfDay, VitalSign};

/// Relative window used to select records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Period {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            "all" => Some(Period::All),
            _ => None,
        }
    }

    /// Earliest included record date, or `None` for an unbounded period
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Year => now.checked_sub_months(Months::new(12)),
            Period::All => None,
        }
    }

    pub fn contains(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.start(now).map_or(true, |start| date >= start)
    }
}

/// `{average, min, max, count}` over a non-empty set of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary<T> {
    /// Arithmetic mean rounded to 2 decimals
    pub average: f64,
    pub min: T,
    pub max: T,
    pub count: usize,
}

/// Summarize values; `None` when there are none
pub fn summarize<T>(values: impl IntoIterator<Item = T>) -> Option<Summary<T>>
where
    T: Copy + PartialOrd + Into<f64>,
{
    let mut iter = values.into_iter();
    let first = iter.next()?;

    let (mut min, mut max) = (first, first);
    let mut sum: f64 = first.into();
    let mut count = 1usize;
    for v in iter {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
        sum += Into::<f64>::into(v);
        count += 1;
    }

    Some(Summary {
        average: round2(sum / count as f64),
        min,
        max,
        count,
    })
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodPressureStats {
    pub systolic: Option<Summary<i32>>,
    pub diastolic: Option<Summary<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalStats {
    pub heart_rate: Option<Summary<i32>>,
    pub blood_pressure: BloodPressureStats,
}

impl VitalStats {
    fn from_vitals<'a>(vitals: impl Iterator<Item = &'a VitalSign> + Clone) -> Self {
        Self {
            heart_rate: summarize(vitals.clone().filter_map(|v| v.heart_rate)),
            blood_pressure: BloodPressureStats {
                systolic: summarize(vitals.clone().filter_map(|v| v.blood_pressure_systolic)),
                diastolic: summarize(vitals.filter_map(|v| v.blood_pressure_diastolic)),
            },
        }
    }
}

/// Vital statistics for one time-of-day bucket, with the bucket's vital sign count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    #[serde(flatten)]
    pub vitals: VitalStats,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ByTimeOfDay {
    pub morning: BucketStats,
    pub afternoon: BucketStats,
    pub evening: BucketStats,
    pub night: BucketStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSignsStats {
    pub overall: VitalStats,
    pub by_time_of_day: ByTimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub weight: Option<Summary<f64>>,
    pub steps: Option<Summary<i32>>,
    pub sleep_hours: Option<Summary<f64>>,
    pub vital_signs: VitalSignsStats,
}

/// Response body of the statistics endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticsReport {
    /// No records fall in the period
    #[serde(rename_all = "camelCase")]
    Empty {
        period: Period,
        count: usize,
        statistics: Option<Statistics>,
    },
    #[serde(rename_all = "camelCase")]
    Computed {
        period: Period,
        records_count: usize,
        vital_signs_count: usize,
        statistics: Statistics,
    },
}

fn bucket<'a>(vitals: &'a [&'a VitalSign], time_of_day: TimeOfDay) -> BucketStats {
    let matching = vitals.iter().copied().filter(move |v| v.time_of_day == time_of_day);
    BucketStats {
        vitals: VitalStats::from_vitals(matching.clone()),
        count: matching.count(),
    }
}

/// Aggregate the records whose date falls inside `period` relative to `now`
pub fn compute(records: &[HealthRecord], period: Period, now: DateTime<Utc>) -> StatisticsReport {
    let selected: Vec<&HealthRecord> = records
        .iter()
        .filter(|r| period.contains(r.date, now))
        .collect();

    if selected.is_empty() {
        return StatisticsReport::Empty {
            period,
            count: 0,
            statistics: None,
        };
    }

    let vitals: Vec<&VitalSign> = selected.iter().flat_map(|r| r.vital_signs.iter()).collect();

    let statistics = Statistics {
        weight: summarize(selected.iter().filter_map(|r| r.weight)),
        steps: summarize(selected.iter().filter_map(|r| r.steps)),
        sleep_hours: summarize(selected.iter().filter_map(|r| r.sleep_hours)),
        vital_signs: VitalSignsStats {
            overall: VitalStats::from_vitals(vitals.iter().copied()),
            by_time_of_day: ByTimeOfDay {
                morning: bucket(&vitals, TimeOfDay::Morning),
                afternoon: bucket(&vitals, TimeOfDay::Afternoon),
                evening: bucket(&vitals, TimeOfDay::Evening),
                night: bucket(&vitals, TimeOfDay::Night),
            },
        },
    };

    StatisticsReport::Computed {
        period,
        records_count: selected.len(),
        vital_signs_count: vitals.len(),
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-14T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn vital(id: u64, time_of_day: TimeOfDay, hr: Option<i32>, sys: Option<i32>, dia: Option<i32>) -> VitalSign {
        VitalSign {
            id,
            record_id: 0,
            timestamp: now(),
            time_of_day,
            heart_rate: hr,
            blood_pressure_systolic: sys,
            blood_pressure_diastolic: dia,
            temperature: None,
            oxygen_saturation: None,
            notes: None,
            created_at: now(),
        }
    }

    fn record(days_ago: i64, weight: Option<f64>, steps: Option<i32>, vitals: Vec<VitalSign>) -> HealthRecord {
        HealthRecord {
            id: days_ago as u64,
            user_id: 1,
            date: now() - Duration::days(days_ago),
            weight,
            steps,
            sleep_hours: None,
            notes: None,
            created_at: now(),
            updated_at: now(),
            vital_signs: vitals,
        }
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert_eq!(summarize(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_summarize_average_min_max_count() {
        let s = summarize(vec![70.0, 71.5, 69.25]).unwrap();
        assert_eq!(s.min, 69.25);
        assert_eq!(s.max, 71.5);
        assert_eq!(s.count, 3);
        // 210.75 / 3 = 70.25
        assert_eq!(s.average, 70.25);
    }

    #[test]
    fn test_summarize_rounds_to_two_decimals() {
        let s = summarize(vec![1, 2, 2]).unwrap();
        assert_eq!(s.average, 1.67);
        assert_eq!(s.min, 1);
        assert_eq!(s.max, 2);
    }

    #[test]
    fn test_summarize_is_order_independent() {
        let a = summarize(vec![5000, 12000, 8000]).unwrap();
        let b = summarize(vec![12000, 8000, 5000]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_period_bounds() {
        let now = now();
        assert!(Period::Week.contains(now - Duration::days(7), now));
        assert!(!Period::Week.contains(now - Duration::days(8), now));
        assert!(Period::Month.contains(now - Duration::days(30), now));
        assert!(!Period::Month.contains(now - Duration::days(31), now));
        assert!(Period::Year.contains(now - Duration::days(364), now));
        assert!(!Period::Year.contains(now - Duration::days(366), now));
        assert!(Period::All.contains(DateTime::<Utc>::default(), now));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("week"), Some(Period::Week));
        assert_eq!(Period::parse("all"), Some(Period::All));
        assert_eq!(Period::parse("decade"), None);
        assert_eq!(Period::default(), Period::Month);
    }

    #[test]
    fn test_empty_period_report() {
        let records = vec![record(40, Some(70.0), None, vec![])];
        let report = compute(&records, Period::Week, now());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "period": "week", "count": 0, "statistics": null })
        );
    }

    #[test]
    fn test_compute_filters_nulls_and_period() {
        let records = vec![
            record(
                1,
                Some(70.0),
                Some(8000),
                vec![
                    vital(1, TimeOfDay::Morning, Some(60), Some(120), Some(80)),
                    vital(2, TimeOfDay::Evening, Some(80), None, None),
                ],
            ),
            record(
                2,
                None,
                Some(10000),
                vec![vital(3, TimeOfDay::Morning, Some(70), Some(130), Some(90))],
            ),
            // Outside the week
            record(20, Some(90.0), Some(1), vec![vital(4, TimeOfDay::Night, Some(200), None, None)]),
        ];

        let report = compute(&records, Period::Week, now());
        let StatisticsReport::Computed {
            records_count,
            vital_signs_count,
            statistics,
            ..
        } = report
        else {
            panic!("expected computed report");
        };

        assert_eq!(records_count, 2);
        assert_eq!(vital_signs_count, 3);

        let weight = statistics.weight.unwrap();
        assert_eq!((weight.count, weight.average), (1, 70.0));
        assert_eq!(statistics.steps.unwrap().average, 9000.0);
        assert_eq!(statistics.sleep_hours, None);

        let overall = &statistics.vital_signs.overall;
        let hr = overall.heart_rate.unwrap();
        assert_eq!((hr.min, hr.max, hr.count, hr.average), (60, 80, 3, 70.0));
        assert_eq!(overall.blood_pressure.systolic.unwrap().count, 2);

        let by = &statistics.vital_signs.by_time_of_day;
        assert_eq!(by.morning.count, 2);
        assert_eq!(by.morning.vitals.heart_rate.unwrap().average, 65.0);
        assert_eq!(by.evening.count, 1);
        assert_eq!(by.evening.vitals.blood_pressure.systolic, None);
        assert_eq!(by.night.count, 0);
        assert_eq!(by.night.vitals.heart_rate, None);
    }

    #[test]
    fn test_report_json_shape() {
        let records = vec![record(
            0,
            Some(70.5),
            None,
            vec![vital(1, TimeOfDay::Afternoon, Some(72), Some(118), Some(76))],
        )];
        let json = serde_json::to_value(compute(&records, Period::All, now())).unwrap();

        assert_eq!(json["period"], "all");
        assert_eq!(json["recordsCount"], 1);
        assert_eq!(json["vitalSignsCount"], 1);
        assert_eq!(json["statistics"]["weight"]["average"], 70.5);
        assert_eq!(json["statistics"]["sleepHours"], serde_json::Value::Null);
        assert_eq!(
            json["statistics"]["vitalSigns"]["overall"]["bloodPressure"]["systolic"]["max"],
            118
        );
        let afternoon = &json["statistics"]["vitalSigns"]["byTimeOfDay"]["afternoon"];
        assert_eq!(afternoon["count"], 1);
        assert_eq!(afternoon["heartRate"]["min"], 72);
        assert_eq!(afternoon["bloodPressure"]["diastolic"]["average"], 76.0);
    }
}
