use serde::Deserialize;

use crate::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::db::records::SortBy;
use crate::error::{AppError, Result};
use crate::stats::Period;

/// Query parameters of the record list endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<String>,
    pub sort_by: Option<String>,
}

/// Query parameters of the statistics endpoint
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsParams {
    pub period: Option<String>,
}

impl ListParams {
    /// Resolve `sortBy` and `limit`, applying defaults for omitted values
    pub fn resolve(&self) -> Result<(SortBy, usize)> {
        let sort_by = match self.sort_by.as_deref() {
            None => SortBy::default(),
            Some(raw) => SortBy::parse(raw).ok_or_else(|| {
                AppError::InvalidInput(
                    "sortBy must be one of: date, weight, steps, sleepHours, createdAt"
                        .to_string(),
                )
            })?,
        };

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIST_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_LIST_LIMIT).contains(n))
                .ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "limit must be an integer between 1 and {}",
                        MAX_LIST_LIMIT
                    ))
                })?,
        };

        Ok((sort_by, limit))
    }
}

impl StatisticsParams {
    /// Resolve `period`, defaulting to the last month
    pub fn resolve(&self) -> Result<Period> {
        match self.period.as_deref() {
            None => Ok(Period::default()),
            Some(raw) => Period::parse(raw).ok_or_else(|| {
                AppError::InvalidInput("period must be one of: week, month, year, all".to_string())
            }),
        }
    }
}

/// Trim a required text field, treating blank as missing
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(limit: Option<&str>, sort_by: Option<&str>) -> ListParams {
        ListParams {
            limit: limit.map(String::from),
            sort_by: sort_by.map(String::from),
        }
    }

    #[test]
    fn test_list_defaults() {
        assert_eq!(
            list(None, None).resolve().unwrap(),
            (SortBy::Date, DEFAULT_LIST_LIMIT)
        );
    }

    #[test]
    fn test_list_explicit_values() {
        assert_eq!(
            list(Some("5"), Some("sleepHours")).resolve().unwrap(),
            (SortBy::SleepHours, 5)
        );
    }

    #[test]
    fn test_list_rejects_bad_values() {
        assert!(list(Some("0"), None).resolve().is_err());
        assert!(list(Some("-3"), None).resolve().is_err());
        assert!(list(Some("ten"), None).resolve().is_err());
        assert!(list(None, Some("password")).resolve().is_err());
    }

    #[test]
    fn test_statistics_period() {
        let params = StatisticsParams::default();
        assert_eq!(params.resolve().unwrap(), Period::Month);

        let params = StatisticsParams {
            period: Some("year".to_string()),
        };
        assert_eq!(params.resolve().unwrap(), Period::Year);

        let params = StatisticsParams {
            period: Some("forever".to_string()),
        };
        assert!(params.resolve().is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  jane ".to_string())), Some("jane".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
