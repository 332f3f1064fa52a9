//! crates/diagnostic_core/src/aggregate.rs
//!
//! Pure derivations from a company's report history into chart-ready
//! shapes. No side effects; an empty history yields the defined empty
//! forms so the dashboard can render a "no data yet" state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Report;

/// One point of the score-over-time line.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub score: i32,
}

/// One axis of the category radar, from the latest report only.
#[derive(Debug, Clone, Serialize)]
pub struct RadarEntry {
    pub subject: String,
    pub value: i32,
    pub full_mark: i32,
}

/// One bucket of the risk bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskEntry {
    pub name: &'static str,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub trend: Vec<TrendPoint>,
    pub radar: Vec<RadarEntry>,
    pub delta: i32,
    pub direction: TrendDirection,
    pub risk: Vec<RiskEntry>,
    pub latest: Option<Report>,
}

/// Derives the full dashboard view from an ascending report history.
pub fn aggregate(history: &[Report]) -> DashboardView {
    let latest = history.last();
    let previous = history.len().checked_sub(2).and_then(|i| history.get(i));

    let trend = history
        .iter()
        .map(|r| TrendPoint {
            date: r.created_at,
            score: r.score,
        })
        .collect();

    let radar = latest
        .map(|r| {
            r.category_scores
                .iter()
                .map(|(subject, value)| RadarEntry {
                    subject: subject.clone(),
                    value: *value,
                    full_mark: 100,
                })
                .collect()
        })
        .unwrap_or_default();

    let (delta, direction) = match (latest, previous) {
        (Some(l), Some(p)) => {
            let delta = l.score - p.score;
            // Flat history counts as Up; a product convention, kept as-is.
            let direction = if delta >= 0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            };
            (delta, direction)
        }
        _ => (0, TrendDirection::Neutral),
    };

    DashboardView {
        trend,
        radar,
        delta,
        direction,
        risk: risk_proxy(latest),
        latest: latest.cloned(),
    }
}

/// Placeholder risk heuristic, not a statistical model: fixed base values
/// per bucket, except the Operational bucket which scales with the latest
/// report's weakness count when that product is non-zero. Presented to
/// the UI as a "heat map proxy" and nothing more.
fn risk_proxy(latest: Option<&Report>) -> Vec<RiskEntry> {
    let operational = latest
        .map(|r| r.weaknesses.len() as i32 * 15)
        .filter(|v| *v != 0)
        .unwrap_or(20);

    let mut risk = vec![
        RiskEntry { name: "Operational", value: operational },
        RiskEntry { name: "Digital", value: 45 },
        RiskEntry { name: "Compliance", value: 30 },
        RiskEntry { name: "Financial", value: 25 },
        RiskEntry { name: "Strategic", value: 55 },
    ];
    risk.sort_by(|a, b| b.value.cmp(&a.value));
    risk
}
