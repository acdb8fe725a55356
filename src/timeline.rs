//! Year-month grouping of search results.
//!
//! Buckets are derived on demand from the current page and the active rating
//! filter. Nothing here holds on to a previous grouping.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::models::Title;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    #[default]
    All,
    AtLeast6,
    AtLeast7,
    AtLeast8,
}

impl RatingFilter {
    pub const ALL: [RatingFilter; 4] = [
        RatingFilter::All,
        RatingFilter::AtLeast8,
        RatingFilter::AtLeast7,
        RatingFilter::AtLeast6,
    ];

    pub fn threshold(&self) -> Option<f64> {
        match self {
            RatingFilter::All => None,
            RatingFilter::AtLeast6 => Some(6.0),
            RatingFilter::AtLeast7 => Some(7.0),
            RatingFilter::AtLeast8 => Some(8.0),
        }
    }

    pub fn matches(&self, title: &Title) -> bool {
        self.threshold().map_or(true, |min| title.vote_average >= min)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingFilter::All => "all",
            RatingFilter::AtLeast6 => "6+",
            RatingFilter::AtLeast7 => "7+",
            RatingFilter::AtLeast8 => "8+",
        }
    }
}

impl FromStr for RatingFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(RatingFilter::All),
            "6" | "6+" => Ok(RatingFilter::AtLeast6),
            "7" | "7+" => Ok(RatingFilter::AtLeast7),
            "8" | "8+" => Ok(RatingFilter::AtLeast8),
            other => Err(format!("unknown rating filter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBucket {
    pub year_month: String,
    pub titles: Vec<Title>,
}

/// `YYYY-MM` prefix of a date, or `None` when the first seven characters are
/// not shaped like one.
pub fn year_month_key(date: &str) -> Option<&str> {
    let key = date.get(..7)?;
    let bytes = key.as_bytes();
    let shaped = bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..].iter().all(u8::is_ascii_digit);
    shaped.then_some(key)
}

/// Groups titles by the year-month of their display date, most recent bucket
/// first. Titles without a usable date are dropped; order inside a bucket is
/// the input order.
pub fn group_by_month<'a, I>(titles: I) -> Vec<TimelineBucket>
where
    I: IntoIterator<Item = &'a Title>,
{
    let mut buckets: BTreeMap<String, Vec<Title>> = BTreeMap::new();
    for title in titles {
        let Some(key) = title.display_date().and_then(year_month_key) else {
            continue;
        };
        buckets.entry(key.to_string()).or_default().push(title.clone());
    }
    buckets
        .into_iter()
        .rev()
        .map(|(year_month, titles)| TimelineBucket { year_month, titles })
        .collect()
}

/// Applies the rating filter and groups what is left.
pub fn build_timeline(titles: &[Title], filter: RatingFilter) -> Vec<TimelineBucket> {
    group_by_month(titles.iter().filter(|t| filter.matches(t)))
}

/// `2023-03` -> `March 2023`. Keys that are not a real month come back as-is.
pub fn format_year_month(key: &str) -> String {
    let parsed = key.split_once('-').and_then(|(y, m)| {
        let year = y.parse::<i32>().ok()?;
        let month = m.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)
    });
    match parsed {
        Some(date) => date.format("%B %Y").to_string(),
        None => key.to_string(),
    }
}

/// Expand/collapse flags per bucket key. Purely presentational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketExpansion {
    expanded: HashSet<String>,
}

impl BucketExpansion {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expanded: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_expanded(&self, year_month: &str) -> bool {
        self.expanded.contains(year_month)
    }

    /// Flips one bucket and returns its new state.
    pub fn toggle(&mut self, year_month: &str) -> bool {
        if self.expanded.remove(year_month) {
            false
        } else {
            self.expanded.insert(year_month.to_string());
            true
        }
    }

    /// Keys in a stable order, for encoding into links.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.expanded.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(id: i64, first_air: Option<&str>, release: Option<&str>) -> Title {
        Title {
            id,
            name: format!("title-{id}"),
            first_air_date: first_air.map(str::to_string),
            release_date: release.map(str::to_string),
            ..Title::default()
        }
    }

    fn rated(id: i64, vote_average: f64) -> Title {
        Title {
            vote_average,
            ..title(id, Some("2024-01-10"), None)
        }
    }

    fn ids(bucket: &TimelineBucket) -> Vec<i64> {
        bucket.titles.iter().map(|t| t.id).collect()
    }

    #[test]
    fn buckets_sorted_most_recent_first() {
        let titles = vec![
            title(1, Some("2021-03-02"), None),
            title(2, Some("2023-11-20"), None),
            title(3, None, Some("2022-01-15")),
        ];
        let keys: Vec<String> = group_by_month(&titles)
            .into_iter()
            .map(|b| b.year_month)
            .collect();
        assert_eq!(keys, vec!["2023-11", "2022-01", "2021-03"]);
    }

    #[test]
    fn keeps_encounter_order_within_bucket() {
        let titles = vec![
            title(5, Some("2023-04-30"), None),
            title(2, Some("2023-04-01"), None),
            title(9, Some("2023-04-15"), None),
        ];
        let buckets = group_by_month(&titles);
        assert_eq!(buckets.len(), 1);
        assert_eq!(ids(&buckets[0]), vec![5, 2, 9]);
    }

    #[test]
    fn drops_titles_without_usable_dates() {
        let titles = vec![
            title(1, None, None),
            title(2, Some(""), Some("")),
            title(3, Some("2023"), None),
            title(4, Some("2023-1"), None),
            title(5, Some("yyyy-mm-dd"), None),
            title(6, Some("2020-07-01"), None),
            title(7, Some(""), Some("2019-12-24")),
        ];
        let buckets = group_by_month(&titles);
        let kept: Vec<i64> = buckets.iter().flat_map(ids).collect();
        assert_eq!(kept, vec![6, 7]);
    }

    #[test]
    fn short_or_multibyte_dates_do_not_panic() {
        assert_eq!(year_month_key(""), None);
        assert_eq!(year_month_key("202"), None);
        assert_eq!(year_month_key("二〇二三年三月"), None);
        assert_eq!(year_month_key("2023-03"), Some("2023-03"));
        assert_eq!(year_month_key("2023-03-09"), Some("2023-03"));
    }

    #[test]
    fn rating_filter_thresholds() {
        let titles = vec![rated(1, 5.5), rated(2, 6.0), rated(3, 7.2), rated(4, 8.9)];
        let count = |filter: RatingFilter| -> usize {
            build_timeline(&titles, filter)
                .iter()
                .map(|b| b.titles.len())
                .sum()
        };
        assert_eq!(count(RatingFilter::AtLeast7), 2);
        assert_eq!(count(RatingFilter::AtLeast8), 1);
        assert_eq!(count(RatingFilter::AtLeast6), 3);
        assert_eq!(count(RatingFilter::All), 4);
    }

    #[test]
    fn rating_filter_parses_query_values() {
        assert_eq!("7+".parse::<RatingFilter>(), Ok(RatingFilter::AtLeast7));
        assert_eq!("".parse::<RatingFilter>(), Ok(RatingFilter::All));
        assert!("9+".parse::<RatingFilter>().is_err());
        for filter in RatingFilter::ALL {
            assert_eq!(filter.as_str().parse::<RatingFilter>(), Ok(filter));
        }
    }

    #[test]
    fn grouping_is_repeatable() {
        let titles = vec![
            title(1, Some("2022-02-02"), None),
            title(2, Some("2022-05-05"), None),
        ];
        assert_eq!(group_by_month(&titles), group_by_month(&titles));
    }

    #[test]
    fn formats_month_headings() {
        assert_eq!(format_year_month("2023-03"), "March 2023");
        assert_eq!(format_year_month("2023-13"), "2023-13");
        assert_eq!(format_year_month("garbage"), "garbage");
    }

    #[test]
    fn expansion_toggles_one_bucket() {
        let mut expansion = BucketExpansion::default();
        assert!(!expansion.is_expanded("2023-11"));
        assert!(expansion.toggle("2023-11"));
        assert!(expansion.is_expanded("2023-11"));
        assert!(!expansion.is_expanded("2023-10"));
        assert!(!expansion.toggle("2023-11"));
        assert!(expansion.keys().is_empty());
    }
}
