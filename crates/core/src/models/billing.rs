//! Billing catalog as served by `GET /api/billing/plans`, plus the
//! hosted checkout and portal sessions the payment provider hands back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::workspace::PlanTier;
use crate::plan::PlanLimits;
use crate::types::RecordId;

/// One purchasable plan. Prices are in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPlan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price_monthly: i64,
    #[serde(default)]
    pub price_yearly: i64,
    pub limits: PlanLimits,
}

/// Plans keyed by tier name (`starter`, `pro`, `studio`).
pub type BillingCatalog = BTreeMap<String, BillingPlan>;

define_wire_enum! {
    /// Billing period of a subscription.
    BillingInterval {
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

impl Default for BillingInterval {
    fn default() -> Self {
        BillingInterval::Monthly
    }
}

/// Body for `POST /api/billing/checkout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub workspace_id: RecordId,
    pub plan: PlanTier,
    pub interval: BillingInterval,
    pub success_url: String,
    pub cancel_url: String,
}

/// Body for `POST /api/billing/portal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    pub workspace_id: RecordId,
    pub return_url: String,
}

/// A hosted page the user should be sent to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSession {
    pub url: String,
    /// Present for checkout sessions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `GET /api/billing/subscription`. `subscription` is the
/// provider's object verbatim, `None` for workspaces that never subscribed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subscription: Option<serde_json::Value>,
}
