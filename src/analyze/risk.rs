//! Risk tiers: score -> (level, percentage) mapping and display lookups.
//!
//! Percentages are piecewise linear and meet at the tier boundaries
//! (3 -> 30, 6 -> 50, 10 -> 70), so the rounded score never drops as the
//! total grows. Full precision is kept until `risk_score()`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ordered severity buckets (`Safe < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Lenient parse for UI/query input; anything unknown maps to `Safe`.
    pub fn parse_or_safe(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "critical" => RiskLevel::Critical,
            _ => RiskLevel::Safe,
        }
    }

    /// Hex color used by the UI badge.
    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::Safe => "#10b981",
            RiskLevel::Low => "#3b82f6",
            RiskLevel::Medium => "#f59e0b",
            RiskLevel::High => "#ef4444",
            RiskLevel::Critical => "#dc2626",
        }
    }

    /// Localized (Korean) label.
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Safe => "안전",
            RiskLevel::Low => "낮음",
            RiskLevel::Medium => "보통",
            RiskLevel::High => "높음",
            RiskLevel::Critical => "매우 위험",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RiskLevel::Safe => "✅",
            RiskLevel::Low => "⚡",
            RiskLevel::Medium => "⚠️",
            RiskLevel::High => "🚨",
            RiskLevel::Critical => "🔴",
        }
    }

    pub fn is_severe(self) -> bool {
        self >= RiskLevel::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn color_for(level: &str) -> &'static str {
    RiskLevel::parse_or_safe(level).color()
}

pub fn label_for(level: &str) -> &'static str {
    RiskLevel::parse_or_safe(level).label()
}

pub fn emoji_for(level: &str) -> &'static str {
    RiskLevel::parse_or_safe(level).emoji()
}

/// Output of [`classify`]: tier plus the unrounded percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub level: RiskLevel,
    pub percentage: f64,
}

impl Classification {
    /// Percentage rounded to the nearest integer, within [0, 100].
    pub fn risk_score(&self) -> u8 {
        self.percentage.round().clamp(0.0, 100.0) as u8
    }
}

/// Map an aggregate pattern score to a tier and percentage. First match wins.
pub fn classify(total_score: f64) -> Classification {
    let (level, percentage) = if total_score >= 10.0 {
        (
            RiskLevel::Critical,
            (70.0 + (total_score - 10.0) * 2.0).min(100.0),
        )
    } else if total_score >= 6.0 {
        (RiskLevel::High, 50.0 + (total_score - 6.0) * 5.0)
    } else if total_score >= 3.0 {
        (RiskLevel::Medium, 30.0 + (total_score - 3.0) * 6.667)
    } else if total_score > 0.0 {
        (RiskLevel::Low, total_score * 10.0)
    } else {
        // zero, negative and NaN all land here
        (RiskLevel::Safe, 0.0)
    };
    Classification { level, percentage }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(score: f64, level: RiskLevel, pct: u8) {
        let c = classify(score);
        assert_eq!(c.level, level, "level for {score}");
        assert_eq!(c.risk_score(), pct, "pct for {score}");
    }

    #[test]
    fn tier_table() {
        check(0.0, RiskLevel::Safe, 0);
        check(1.5, RiskLevel::Low, 15);
        check(2.999, RiskLevel::Low, 30);
        check(3.0, RiskLevel::Medium, 30);
        check(4.5, RiskLevel::Medium, 40);
        check(6.0, RiskLevel::High, 50);
        check(8.0, RiskLevel::High, 60);
        check(10.0, RiskLevel::Critical, 70);
        check(12.5, RiskLevel::Critical, 75);
        check(25.0, RiskLevel::Critical, 100);
        check(60.0, RiskLevel::Critical, 100);
    }

    #[test]
    fn negative_and_nan_are_safe() {
        check(-1.0, RiskLevel::Safe, 0);
        check(f64::NAN, RiskLevel::Safe, 0);
    }

    #[test]
    fn percentage_keeps_precision_until_rounding() {
        let c = classify(4.5);
        assert!((c.percentage - 40.0005).abs() < 1e-9);
        assert_eq!(c.risk_score(), 40);
    }

    #[test]
    fn rounded_score_is_monotonic() {
        let mut prev = 0u8;
        let mut prev_level = RiskLevel::Safe;
        let mut s = 0.0;
        while s <= 40.0 {
            let c = classify(s);
            assert!(c.risk_score() >= prev, "score dropped at {s}");
            assert!(c.level >= prev_level, "tier dropped at {s}");
            prev = c.risk_score();
            prev_level = c.level;
            s += 0.05;
        }
    }

    #[test]
    fn boundaries_have_no_negative_jump() {
        for b in [3.0_f64, 6.0, 10.0] {
            let below = classify(b - 1e-9).risk_score();
            let at = classify(b).risk_score();
            assert!(below <= at, "jump at {b}: {below} > {at}");
        }
        assert!(classify(1e-9).risk_score() >= classify(0.0).risk_score());
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(RiskLevel::ALL.windows(2).all(|w| w[0] < w[1]));
        assert!(RiskLevel::High.is_severe());
        assert!(!RiskLevel::Medium.is_severe());
    }

    #[test]
    fn display_lookups_default_to_safe() {
        assert_eq!(color_for("critical"), "#dc2626");
        assert_eq!(label_for("HIGH"), "높음");
        assert_eq!(emoji_for("medium"), "⚠️");
        assert_eq!(color_for("bogus"), RiskLevel::Safe.color());
        assert_eq!(label_for(""), "안전");
        assert_eq!(emoji_for("unknown"), "✅");
    }
}
