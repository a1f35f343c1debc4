use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One time-before-start bracket. Tiers are sorted by descending threshold;
/// the last tier must have `min_hours_before == 0` so [0, inf) is covered.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CancellationTier {
    pub min_hours_before: i64,
    pub fee_pct: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub tiers: Vec<CancellationTier>,
}

impl CancellationPolicy {
    /// Parses "24:0,4:50,0:100" into descending tiers.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut tiers = Vec::new();
        for part in raw.split(',') {
            let (hours, pct) = part
                .split_once(':')
                .ok_or_else(|| format!("malformed tier '{}'", part))?;
            let min_hours_before: i64 = hours.trim().parse().map_err(|_| format!("bad hours in '{}'", part))?;
            let fee_pct: u8 = pct.trim().parse().map_err(|_| format!("bad fee in '{}'", part))?;
            if fee_pct > 100 {
                return Err(format!("fee above 100% in '{}'", part));
            }
            tiers.push(CancellationTier { min_hours_before, fee_pct });
        }
        Self::from_tiers(tiers)
    }

    pub fn from_tiers(tiers: Vec<CancellationTier>) -> Result<Self, String> {
        if tiers.is_empty() {
            return Err("at least one tier required".to_string());
        }
        for pair in tiers.windows(2) {
            if pair[0].min_hours_before <= pair[1].min_hours_before {
                return Err("tiers must be strictly descending".to_string());
            }
        }
        if tiers[tiers.len() - 1].min_hours_before != 0 {
            return Err("last tier must start at 0 hours".to_string());
        }
        Ok(Self { tiers })
    }

    /// Fee percentage for a cancellation with the given lead time before start.
    /// A lead time exactly on a tier boundary takes the earlier (cheaper) tier.
    pub fn fee_for_lead(&self, lead: Duration) -> u8 {
        let lead_minutes = lead.num_minutes().max(0);
        for tier in &self.tiers {
            if lead_minutes >= tier.min_hours_before * 60 {
                return tier.fee_pct;
            }
        }
        // Unreachable with a validated policy; the 0-hour tier matches any lead.
        self.tiers[self.tiers.len() - 1].fee_pct
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NoShowRecord {
    pub id: String,
    pub client_id: String,
    pub booking_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NoShowRecord {
    pub fn new(client_id: String, booking_id: Option<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_id,
            booking_id,
            occurred_at,
        }
    }
}

/// Derived from the rolling no-show window, never stored.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct BlockStatus {
    pub active_until: DateTime<Utc>,
}
