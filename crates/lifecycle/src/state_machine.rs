//! Guards the campaign lifecycle by enforcing a finite set of valid
//! state transitions, each with an actor requirement. `rejected` and
//! `completed` are terminal; re-submission creates a new campaign.

use chrono::NaiveDate;
use tracing::info;

use adserve_core::error::{AdServeError, AdServeResult};
use adserve_core::store::CampaignStore;
use adserve_core::types::{Actor, Campaign, CampaignStatus};

/// Who may drive a given edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// Administrator only (approval decisions).
    AdminOnly,
    /// The owning advertiser, or an administrator.
    OwnerOrAdmin,
}

/// A single valid edge in the campaign lifecycle.
#[derive(Debug, Clone, Copy)]
struct Transition {
    from: CampaignStatus,
    to: CampaignStatus,
    guard: Guard,
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        from: CampaignStatus::Pending,
        to: CampaignStatus::Active,
        guard: Guard::AdminOnly,
    },
    Transition {
        from: CampaignStatus::Pending,
        to: CampaignStatus::Rejected,
        guard: Guard::AdminOnly,
    },
    Transition {
        from: CampaignStatus::Active,
        to: CampaignStatus::Paused,
        guard: Guard::OwnerOrAdmin,
    },
    Transition {
        from: CampaignStatus::Paused,
        to: CampaignStatus::Active,
        guard: Guard::OwnerOrAdmin,
    },
    Transition {
        from: CampaignStatus::Active,
        to: CampaignStatus::Completed,
        guard: Guard::OwnerOrAdmin,
    },
];

fn edge(from: CampaignStatus, to: CampaignStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.to == to)
}

/// Returns true if the given edge exists, regardless of actor.
pub fn can_transition(from: CampaignStatus, to: CampaignStatus) -> bool {
    edge(from, to).is_some()
}

/// Checks both the edge and the actor's authority over it. Invalid
/// requests fail loudly; there is no silent no-op path.
pub fn validate(campaign: &Campaign, to: CampaignStatus, actor: &Actor) -> AdServeResult<()> {
    let Some(transition) = edge(campaign.status, to) else {
        return Err(AdServeError::InvalidTransition {
            from: campaign.status,
            to,
        });
    };

    let permitted = match transition.guard {
        Guard::AdminOnly => matches!(actor, Actor::Admin),
        Guard::OwnerOrAdmin => match actor {
            Actor::Admin => true,
            Actor::Advertiser { id } => *id == campaign.advertiser_id,
        },
    };

    if permitted {
        Ok(())
    } else {
        Err(AdServeError::PermissionDenied {
            actor: actor.to_string(),
            from: campaign.status,
            to,
        })
    }
}

/// Applies a validated transition and persists it through the store.
/// Returns the campaign with its new status.
pub async fn transition(
    store: &dyn CampaignStore,
    campaign: &Campaign,
    to: CampaignStatus,
    actor: &Actor,
) -> AdServeResult<Campaign> {
    validate(campaign, to, actor)?;
    store.set_status(campaign.id, to).await?;
    info!(
        campaign_id = %campaign.id,
        from = ?campaign.status,
        to = ?to,
        actor = %actor,
        "campaign status changed"
    );

    let mut updated = campaign.clone();
    updated.status = to;
    Ok(updated)
}

/// A campaign is a matching candidate only when approved and inside its
/// scheduled window. Approval and scheduling are independent concerns:
/// `active` outside the window is not served, by design.
pub fn eligible(campaign: &Campaign, today: NaiveDate) -> bool {
    campaign.status == CampaignStatus::Active && campaign.window.contains(today)
}
