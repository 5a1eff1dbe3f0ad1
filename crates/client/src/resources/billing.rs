use reqwest::Method;
use serde_json::json;
use studioai_core::models::billing::{
    BillingCatalog, BillingInterval, BillingSession, CheckoutRequest, PortalRequest, SubscriptionStatus,
};
use studioai_core::models::workspace::PlanTier;
use studioai_core::plan::PlanGate;

use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// `GET /api/billing/plans`.
    pub fn billing_plans(&self) -> Query<BillingCatalog> {
        self.get_query(
            keys::billing_plans(),
            QueryOptions::default(),
            "/api/billing/plans".into(),
            vec![],
        )
    }

    /// Entitlements of the active workspace. Limits reported in the usage
    /// snapshot take precedence over the built-in plan catalog.
    pub async fn plan_gate(&self) -> Result<PlanGate, ClientError> {
        let workspace = self
            .stores
            .workspace
            .active_workspace()
            .ok_or(ClientError::NoWorkspace)?;
        let usage = self.workspace_usage()?.fetch().await?;
        let plan = usage.plan.clone().unwrap_or(workspace.plan);
        Ok(PlanGate::new(plan, Some((*usage).clone())))
    }

    /// `GET /api/billing/subscription?workspaceId=`.
    pub fn billing_subscription(&self) -> Result<Query<SubscriptionStatus>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::billing_subscription(&wid),
            QueryOptions::default(),
            "/api/billing/subscription".into(),
            vec![("workspaceId", wid)],
        ))
    }

    /// Open a hosted checkout for `plan`. The caller sends the user to the
    /// returned URL. Asking for the plan the workspace already has is
    /// rejected locally.
    pub async fn start_checkout(
        &self,
        plan: PlanTier,
        interval: BillingInterval,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<BillingSession, ClientError> {
        let workspace = self
            .stores
            .workspace
            .active_workspace()
            .ok_or(ClientError::NoWorkspace)?;
        let mutation = Mutation::StartCheckout { workspace_id: workspace.id.clone() };
        self.mutate(mutation, async {
            if plan == workspace.plan {
                return Err(ClientError::Validation(format!(
                    "This workspace is already on the {plan} plan"
                )));
            }
            let body = CheckoutRequest {
                workspace_id: workspace.id.clone(),
                plan,
                interval,
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
            };
            self.api
                .send(Method::POST, "/api/billing/checkout", Payload::json(&body)?)
                .await
        })
        .await
    }

    /// Open the payment provider's self-service portal.
    pub async fn open_billing_portal(&self, return_url: &str) -> Result<BillingSession, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::OpenBillingPortal { workspace_id: wid.clone() };
        let body = PortalRequest {
            workspace_id: wid,
            return_url: return_url.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(Method::POST, "/api/billing/portal", Payload::json(&body)?)
                .await
        })
        .await
    }

    /// Cancel the subscription at the end of the current period.
    pub async fn cancel_subscription(&self) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CancelSubscription { workspace_id: wid.clone() };
        self.mutate(
            mutation,
            self.api.send_unit(
                Method::POST,
                "/api/billing/cancel",
                Payload::Json(json!({ "workspaceId": wid })),
            ),
        )
        .await
    }
}
