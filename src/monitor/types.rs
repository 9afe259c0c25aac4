use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const HISTORY_VERSION: u32 = 1;

/// One monitoring sample. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub quality_score: u32,
    pub test_accuracy: f64,
    /// Contacts classified per second
    pub performance_speed: f64,
    pub validation_passed: bool,
    pub issues_found: usize,
}

/// Append-only history of one ruleset, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub version: u32,
    #[serde(default)]
    points: Vec<HistoryPoint>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            version: HISTORY_VERSION,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    /// Append a point, keeping the list ordered by timestamp.
    pub fn push(&mut self, point: HistoryPoint) {
        let at = self.points.partition_point(|p| p.timestamp <= point.timestamp);
        self.points.insert(at, point);
    }

    /// Points recorded at or after `since`.
    pub fn since(&self, since: DateTime<Utc>) -> &[HistoryPoint] {
        let start = self.points.partition_point(|p| p.timestamp < since);
        &self.points[start..]
    }

    /// Drop points older than `retention` relative to `now`. Returns how
    /// many were dropped.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let cutoff = now.checked_sub_signed(retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = self.points.len();
        self.points.retain(|p| p.timestamp >= cutoff);
        before - self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(days_ago: i64, quality: u32) -> HistoryPoint {
        HistoryPoint {
            timestamp: Utc::now() - Duration::days(days_ago),
            quality_score: quality,
            test_accuracy: 0.9,
            performance_speed: 5000.0,
            validation_passed: true,
            issues_found: 0,
        }
    }

    #[test]
    fn test_push_keeps_order() {
        let mut history = History::new();
        history.push(point(1, 80));
        history.push(point(5, 70));
        history.push(point(3, 75));
        let qualities: Vec<u32> = history.points().iter().map(|p| p.quality_score).collect();
        assert_eq!(qualities, vec![70, 75, 80]);
    }

    #[test]
    fn test_since_window() {
        let mut history = History::new();
        for days in [40, 20, 10, 1] {
            history.push(point(days, 80));
        }
        let since = Utc::now() - Duration::days(15);
        assert_eq!(history.since(since).len(), 2);
    }

    #[test]
    fn test_prune_retention() {
        let mut history = History::new();
        for days in [120, 91, 89, 1] {
            history.push(point(days, 80));
        }
        let dropped = history.prune(Utc::now(), Duration::days(90));
        assert_eq!(dropped, 2);
        assert_eq!(history.points().len(), 2);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut history = History::new();
        history.push(point(2, 77));
        let json = serde_json::to_string(&history).unwrap();
        let parsed: History = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
