use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, SecondsFormat, Utc};

/// Insert or replace the condition of `condition_type`
///
/// Existing conditions keep their position. The message is always refreshed; the
/// transition time only moves when the status or the reason changes.
pub fn upsert_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        if existing.status != status || existing.reason != reason {
            existing.status = status;
            existing.reason = reason.to_string();
            existing.last_transition_time = timestamp;
        }
        existing.message = message.to_string();
        return;
    }

    conditions.push(Condition {
        r#type: condition_type.to_string(),
        status,
        reason: reason.to_string(),
        message: message.to_string(),
        last_transition_time: timestamp,
    });
}
