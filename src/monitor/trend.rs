use serde::Serialize;

/// Points averaged at each end of the window
const EDGE_POINTS: usize = 3;
/// Relative change, in percent, beyond which a metric is moving
const MOVING_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
            TrendDirection::InsufficientData => "insufficient data",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Percent change from the earliest to the most recent points; `None`
    /// when it cannot be expressed relative to the start
    pub change_pct: Option<f64>,
}

impl Trend {
    pub fn insufficient() -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            change_pct: None,
        }
    }

    /// Declining by more than `pct` percent.
    pub fn declines_more_than(&self, pct: f64) -> bool {
        self.direction == TrendDirection::Declining && self.change_pct.is_some_and(|c| c < -pct)
    }
}

/// Compare the mean of the most recent three values with the mean of the
/// earliest three. Values are oldest first.
pub fn compute(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::insufficient();
    }

    let edge = EDGE_POINTS.min(values.len());
    let early = mean(&values[..edge]);
    let recent = mean(&values[values.len() - edge..]);

    if early.abs() < f64::EPSILON {
        let direction = if recent > 0.0 {
            TrendDirection::Improving
        } else if recent < 0.0 {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        };
        return Trend {
            direction,
            change_pct: None,
        };
    }

    let change = (recent - early) / early.abs() * 100.0;
    let direction = if change > MOVING_PCT {
        TrendDirection::Improving
    } else if change < -MOVING_PCT {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    Trend {
        direction,
        change_pct: Some(change),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
