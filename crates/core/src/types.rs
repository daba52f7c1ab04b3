use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named slot in the page layout where an ad may render.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    TopBanner,
    Sidebar,
    InlineCard,
    FooterBanner,
    Interstitial,
    FloatingCta,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Active,
    Rejected,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

/// Inclusive calendar-day window during which an approved campaign may
/// serve. Approval and scheduling are independent: an `active` campaign
/// outside its window is not served.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ActiveWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Advertiser-authored audience filters. An absent (or empty) dimension
/// is a wildcard; matching is AND across dimensions, OR within a
/// dimension's set. Unknown keys are rejected at the store boundary so
/// the matcher never has to guess shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    /// Single-value equality, not a set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
}

impl TargetingRule {
    /// True when no dimension is populated. An open rule matches every
    /// user.
    pub fn is_open(&self) -> bool {
        fn unset<T>(set: &Option<Vec<T>>) -> bool {
            set.as_ref().map_or(true, |v| v.is_empty())
        }
        unset(&self.courses)
            && unset(&self.genders)
            && unset(&self.years)
            && unset(&self.age_groups)
            && unset(&self.residence_types)
            && unset(&self.interests)
            && self.college.is_none()
    }
}

/// Viewer attributes consumed by the matcher. A missing attribute is
/// "no opinion", never "no match".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub residence_type: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// An ad campaign as stored, including display metadata that plays no
/// part in matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub advertiser_id: String,
    pub title: String,
    pub placement: Placement,
    #[serde(default)]
    pub targeting: TargetingRule,
    pub window: ActiveWindow,
    pub status: CampaignStatus,
    pub budget: f64,
    pub media_url: String,
    pub media_type: MediaType,
    pub call_to_action: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdEventType {
    Impression,
    Click,
    View,
}

/// Append-only telemetry record. Duplicates are acceptable; delivery is
/// best-effort, not accounting-grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdEvent {
    pub user_id: String,
    pub ad_id: Uuid,
    pub event_type: AdEventType,
    pub placement: Placement,
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl AdEvent {
    fn build(
        user_id: &str,
        campaign: &Campaign,
        page: &str,
        event_type: AdEventType,
        duration_seconds: Option<u32>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            ad_id: campaign.id,
            event_type,
            placement: campaign.placement,
            page: page.to_string(),
            duration_seconds,
            timestamp: Utc::now(),
        }
    }

    pub fn impression(user_id: &str, campaign: &Campaign, page: &str) -> Self {
        Self::build(user_id, campaign, page, AdEventType::Impression, None)
    }

    pub fn click(user_id: &str, campaign: &Campaign, page: &str) -> Self {
        Self::build(user_id, campaign, page, AdEventType::Click, None)
    }

    pub fn view(user_id: &str, campaign: &Campaign, page: &str, duration_seconds: u32) -> Self {
        Self::build(
            user_id,
            campaign,
            page,
            AdEventType::View,
            Some(duration_seconds),
        )
    }
}

/// The principal attempting a lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Admin,
    Advertiser { id: String },
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Admin => write!(f, "admin"),
            Actor::Advertiser { id } => write!(f, "advertiser {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_window_inclusive_boundaries() {
        let window = ActiveWindow {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };

        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn test_targeting_rule_open_when_empty_or_absent() {
        assert!(TargetingRule::default().is_open());

        let rule = TargetingRule {
            courses: Some(Vec::new()),
            ..Default::default()
        };
        assert!(rule.is_open());

        let rule = TargetingRule {
            college: Some("Engineering".to_string()),
            ..Default::default()
        };
        assert!(!rule.is_open());
    }

    #[test]
    fn test_targeting_rule_rejects_unknown_keys() {
        let raw = r#"{"courses": ["CS"], "zodiac_signs": ["leo"]}"#;
        assert!(serde_json::from_str::<TargetingRule>(raw).is_err());

        let raw = r#"{"courses": ["CS"], "years": [1, 2]}"#;
        let rule: TargetingRule = serde_json::from_str(raw).unwrap();
        assert_eq!(rule.years.as_deref(), Some(&[1, 2][..]));
    }

    #[test]
    fn test_placement_wire_names() {
        let json = serde_json::to_string(&Placement::TopBanner).unwrap();
        assert_eq!(json, "\"top-banner\"");
        let back: Placement = serde_json::from_str("\"floating-cta\"").unwrap();
        assert_eq!(back, Placement::FloatingCta);
    }
}
