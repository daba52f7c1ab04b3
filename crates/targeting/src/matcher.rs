//! Rule evaluation. AND across dimensions, OR within a dimension's set.

use adserve_core::types::{TargetingRule, UserProfile};

/// Returns true when every populated dimension of `rule` admits
/// `profile`.
///
/// A dimension only constrains when the rule populates it and the
/// profile carries a value for it. It is the advertiser's targeting, not
/// the user's profile, whose absence narrows eligibility: a user who
/// never filled in an attribute is never disqualified by it.
pub fn matches(profile: &UserProfile, rule: &TargetingRule) -> bool {
    dimension_passes(rule.courses.as_deref(), profile.course.as_ref())
        && dimension_passes(rule.genders.as_deref(), profile.gender.as_ref())
        && dimension_passes(rule.years.as_deref(), profile.year.as_ref())
        && dimension_passes(rule.age_groups.as_deref(), profile.age_group.as_ref())
        && dimension_passes(
            rule.residence_types.as_deref(),
            profile.residence_type.as_ref(),
        )
        && interests_pass(rule.interests.as_deref(), &profile.interests)
        && college_passes(rule.college.as_deref(), profile.college.as_deref())
}

/// OR within the set: the user's value must appear in the rule's set
/// when both sides are present.
fn dimension_passes<T: PartialEq>(allowed: Option<&[T]>, value: Option<&T>) -> bool {
    match (populated(allowed), value) {
        (Some(allowed), Some(value)) => allowed.contains(value),
        _ => true,
    }
}

/// Interests OR-match on any overlap. A user with no interests recorded
/// skips the dimension.
fn interests_pass(allowed: Option<&[String]>, interests: &[String]) -> bool {
    match populated(allowed) {
        Some(allowed) if !interests.is_empty() => interests.iter().any(|i| allowed.contains(i)),
        _ => true,
    }
}

/// `college` is scalar equality, applied only when both rule and profile
/// specify it.
fn college_passes(required: Option<&str>, college: Option<&str>) -> bool {
    match (required, college) {
        (Some(required), Some(college)) => required == college,
        _ => true,
    }
}

/// An empty set on a rule behaves as an unpopulated dimension.
fn populated<T>(allowed: Option<&[T]>) -> Option<&[T]> {
    allowed.filter(|a| !a.is_empty())
}
