//! Plan catalog and entitlement gate.
//!
//! Everything here is advisory: it hides or disables creation actions and
//! drives upgrade prompts. The server enforces the real limits and may
//! still reject an action the gate allowed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::workspace::{PlanTier, UsageSnapshot};

/// Wire sentinel for "no limit".
pub const UNLIMITED_SENTINEL: i64 = -1;

/// A quantity entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Limited(u32),
    Unlimited,
}

impl Limit {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// Whether `used` has reached the limit. Unlimited is never reached.
    pub fn is_reached(self, used: u32) -> bool {
        match self {
            Limit::Limited(max) => used >= max,
            Limit::Unlimited => false,
        }
    }

    pub fn remaining(self, used: u32) -> Remaining {
        match self {
            Limit::Limited(max) => Remaining::Count(max.saturating_sub(used)),
            Limit::Unlimited => Remaining::Unlimited,
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Limited(max) => serializer.serialize_i64(i64::from(*max)),
            Limit::Unlimited => serializer.serialize_i64(UNLIMITED_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        // Any negative value means unlimited; servers only ever send -1.
        if raw < 0 {
            Ok(Limit::Unlimited)
        } else {
            u32::try_from(raw)
                .map(Limit::Limited)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// Remaining allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Count(u32),
    Unlimited,
}

/// Quantity entitlements of one plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub shows: Limit,
    pub characters_per_show: Limit,
    pub episodes_per_month: Limit,
    pub team: Limit,
}

impl PlanLimits {
    pub const STARTER: PlanLimits = PlanLimits {
        shows: Limit::Limited(1),
        characters_per_show: Limit::Limited(3),
        episodes_per_month: Limit::Limited(4),
        team: Limit::Limited(1),
    };

    pub const PRO: PlanLimits = PlanLimits {
        shows: Limit::Limited(3),
        characters_per_show: Limit::Limited(10),
        episodes_per_month: Limit::Unlimited,
        team: Limit::Limited(5),
    };

    pub const STUDIO: PlanLimits = PlanLimits {
        shows: Limit::Unlimited,
        characters_per_show: Limit::Unlimited,
        episodes_per_month: Limit::Unlimited,
        team: Limit::Unlimited,
    };

    /// Display defaults for a tier. Unknown tiers get starter limits.
    pub fn for_plan(plan: &PlanTier) -> PlanLimits {
        match plan {
            PlanTier::Pro => PlanLimits::PRO,
            PlanTier::Studio => PlanLimits::STUDIO,
            PlanTier::Starter | PlanTier::Other(_) => PlanLimits::STARTER,
        }
    }

    /// Replace catalog values with any limits the server reported.
    pub fn with_server_overrides(mut self, usage: &UsageSnapshot) -> PlanLimits {
        if let Some(shows) = usage.max_shows {
            self.shows = shows;
        }
        if let Some(episodes) = usage.episodes_per_month {
            self.episodes_per_month = episodes;
        }
        if let Some(team) = usage.max_team {
            self.team = team;
        }
        self
    }
}

/// Boolean predicates derived from a plan and a usage snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanGate {
    plan: PlanTier,
    limits: PlanLimits,
    usage: UsageSnapshot,
}

impl PlanGate {
    /// Build a gate for `plan`. A missing usage snapshot counts as zero use.
    pub fn new(plan: PlanTier, usage: Option<UsageSnapshot>) -> Self {
        let usage = usage.unwrap_or_default();
        let limits = PlanLimits::for_plan(&plan).with_server_overrides(&usage);
        Self {
            plan,
            limits,
            usage,
        }
    }

    pub fn plan(&self) -> &PlanTier {
        &self.plan
    }

    pub fn limits(&self) -> &PlanLimits {
        &self.limits
    }

    pub fn usage(&self) -> &UsageSnapshot {
        &self.usage
    }

    pub fn is_at_show_limit(&self) -> bool {
        self.limits.shows.is_reached(self.usage.shows_used)
    }

    pub fn is_at_episode_limit(&self) -> bool {
        self.limits
            .episodes_per_month
            .is_reached(self.usage.episodes_this_month)
    }

    pub fn is_at_team_limit(&self) -> bool {
        self.limits.team.is_reached(self.usage.team_used)
    }

    /// The usage endpoint has no per-show character count, so the caller
    /// passes the size of the show's character list.
    pub fn is_at_character_limit(&self, characters_in_show: u32) -> bool {
        self.limits.characters_per_show.is_reached(characters_in_show)
    }

    pub fn shows_remaining(&self) -> Remaining {
        self.limits.shows.remaining(self.usage.shows_used)
    }

    pub fn episodes_remaining(&self) -> Remaining {
        self.limits
            .episodes_per_month
            .remaining(self.usage.episodes_this_month)
    }

    pub fn team_remaining(&self) -> Remaining {
        self.limits.team.remaining(self.usage.team_used)
    }

    pub fn is_pro(&self) -> bool {
        matches!(self.plan, PlanTier::Pro | PlanTier::Studio)
    }

    pub fn is_studio(&self) -> bool {
        self.plan == PlanTier::Studio
    }

    pub fn has_priority_rendering(&self) -> bool {
        self.is_studio()
    }

    pub fn has_youtube_publish(&self) -> bool {
        self.is_pro()
    }
}
