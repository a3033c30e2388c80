//! Site visit and property search statistics.
//!
//! Both tables are append-only. Aggregation happens here, over the full
//! table, since the store offers no grouping.

use crate::commands::{optional_text, CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{PropertySearchStat, SiteVisit};
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Grouping for visit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeframe {
    #[default]
    Day,
    /// ISO 8601 week.
    Week,
    Month,
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }

    /// Bucket label; labels sort in chronological order.
    pub fn bucket(&self, at: &DateTime<Utc>) -> String {
        match self {
            Timeframe::Day => at.format("%Y-%m-%d").to_string(),
            Timeframe::Week => {
                let week = at.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Timeframe::Month => at.format("%Y-%m").to_string(),
            Timeframe::Year => format!("{:04}", at.year()),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = CabinetError;

    fn from_str(s: &str) -> Result<Self> {
        Timeframe::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CabinetError::Precondition(format!(
                    "unknown timeframe '{}' (day, week, month, year)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitCount {
    pub period: String,
    pub visits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchBreakdown {
    pub by_location: Vec<Tally>,
    pub by_type: Vec<Tally>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchInput {
    pub property_id: Option<Uuid>,
    pub search_type: String,
    pub architecture_preference: Option<String>,
    pub location_preference: Option<String>,
    pub price_range_min: Option<f64>,
    pub price_range_max: Option<f64>,
}

pub fn record_visit<S: DataStore>(
    store: &mut S,
    page: Option<&str>,
    at: DateTime<Utc>,
) -> Result<CmdResult<SiteVisit>> {
    let visit = SiteVisit {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        visited_at: at,
        page: optional_text(page),
    };
    let created = store.insert_record(&visit)?;
    tracing::debug!(page = ?created.page, "visit recorded");
    Ok(CmdResult::single(created, CmdMessage::success("Visit recorded")))
}

/// Visits per period, oldest period first.
pub fn visit_counts<S: DataStore>(store: &S, timeframe: Timeframe) -> Result<Vec<VisitCount>> {
    let visits: Vec<SiteVisit> = store.list_records(&Filter::new())?;
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for visit in &visits {
        *buckets.entry(timeframe.bucket(&visit.visited_at)).or_default() += 1;
    }
    Ok(buckets
        .into_iter()
        .map(|(period, visits)| VisitCount { period, visits })
        .collect())
}

pub fn record_search<S: DataStore>(
    store: &mut S,
    input: SearchInput,
) -> Result<CmdResult<PropertySearchStat>> {
    let mut v = Validator::new();
    v.required("search_type", &input.search_type);
    if let (Some(min), Some(max)) = (input.price_range_min, input.price_range_max) {
        v.check(min <= max, "price_range_min", "minimum price is above the maximum");
    }
    v.finish()?;

    let now = Utc::now();
    let stat = PropertySearchStat {
        id: Uuid::new_v4(),
        created_at: now,
        property_id: input.property_id,
        search_date: now,
        search_type: input.search_type.trim().to_string(),
        architecture_preference: optional_text(input.architecture_preference.as_deref()),
        location_preference: optional_text(input.location_preference.as_deref()),
        price_range_min: input.price_range_min,
        price_range_max: input.price_range_max,
    };
    let created = store.insert_record(&stat)?;
    tracing::debug!(search_type = %created.search_type, "search recorded");
    Ok(CmdResult::single(created, CmdMessage::success("Search recorded")))
}

fn tally<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Tally> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    let mut tallies: Vec<Tally> = counts
        .into_iter()
        .map(|(name, count)| Tally {
            name: name.to_string(),
            count,
        })
        .collect();
    tallies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tallies
}

/// Search counts per preferred location and per search type, most frequent
/// first. Searches without a location preference only count by type.
pub fn search_breakdown<S: DataStore>(store: &S) -> Result<SearchBreakdown> {
    let stats: Vec<PropertySearchStat> = store.list_records(&Filter::new())?;
    Ok(SearchBreakdown {
        by_location: tally(
            stats
                .iter()
                .filter_map(|s| s.location_preference.as_deref())
                .filter(|l| !l.trim().is_empty()),
        ),
        by_type: tally(stats.iter().map(|s| s.search_type.as_str())),
    })
}
