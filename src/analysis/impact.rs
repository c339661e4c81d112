//! Coarse impact tiering.

use crate::models::ImpactTier;

/// Score above which a session is `Medium`.
pub const MEDIUM_THRESHOLD: f64 = 100.0;
/// Score above which a session is `High`.
pub const HIGH_THRESHOLD: f64 = 400.0;

const MB_WEIGHT: f64 = 5.0;
const LOCK_WEIGHT: f64 = 50.0;

/// Impact score and the tier it falls in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub score: f64,
    pub tier: ImpactTier,
}

/// Scores a session: `duration + 5 * MB + 50 * locks`.
pub fn score(duration_sec: f64, est_mb: f64, locks: u64) -> Impact {
    let score = duration_sec + est_mb * MB_WEIGHT + locks as f64 * LOCK_WEIGHT;
    Impact {
        score,
        tier: tier_for(score),
    }
}

/// Thresholds are exclusive: exactly 100 is `Low`, exactly 400 is `Medium`.
pub fn tier_for(score: f64) -> ImpactTier {
    if score > HIGH_THRESHOLD {
        ImpactTier::High
    } else if score > MEDIUM_THRESHOLD {
        ImpactTier::Medium
    } else {
        ImpactTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_exclusive() {
        assert_eq!(tier_for(100.0), ImpactTier::Low);
        assert_eq!(tier_for(100.01), ImpactTier::Medium);
        assert_eq!(tier_for(400.0), ImpactTier::Medium);
        assert_eq!(tier_for(400.01), ImpactTier::High);
        assert_eq!(tier_for(0.0), ImpactTier::Low);
    }

    #[test]
    fn locks_dominate_the_score() {
        let i = score(10.0, 2.0, 2);
        assert_eq!(i.score, 120.0);
        assert_eq!(i.tier, ImpactTier::Medium);

        let i = score(1.0, 0.0, 9);
        assert_eq!(i.score, 451.0);
        assert_eq!(i.tier, ImpactTier::High);
    }

    #[test]
    fn short_cheap_session_is_low() {
        assert_eq!(score(6.0, 0.06, 0).tier, ImpactTier::Low);
    }
}
