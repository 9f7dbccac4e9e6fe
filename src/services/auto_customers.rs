//! Auto customers service (recurring templates, skips and overrides)

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        auto_customer::{AutoCustomerQuery, CreateAutoCustomer, UpdateAutoCustomer},
        AutoCustomer, OccurrenceOverride,
    },
    repository::Repository,
};

fn minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}

fn check_bounds(start_from: NaiveDate, until: Option<NaiveDate>) -> AppResult<()> {
    match until {
        Some(until) if until < start_from => Err(AppError::Validation(format!(
            "`until` ({}) is before `start_from` ({})",
            until, start_from
        ))),
        _ => Ok(()),
    }
}

/// Bounds of `current` once `data` is applied
fn check_update(current: &AutoCustomer, data: &UpdateAutoCustomer) -> AppResult<()> {
    if let Some(Some(max)) = data.max_occurrences {
        if max < 1 {
            return Err(AppError::Validation("Max occurrences must be positive".to_string()));
        }
    }
    let until = match data.until {
        Some(until) => until,
        None => current.until,
    };
    check_bounds(data.start_from.unwrap_or(current.start_from), until)
}

/// Add a planned start to the skip list. Returns false if already skipped.
pub fn add_skip(skipped: &mut Vec<DateTime<Utc>>, original_start: DateTime<Utc>) -> bool {
    let key = minute(original_start);
    if skipped.iter().any(|s| minute(*s) == key) {
        return false;
    }
    skipped.push(key);
    skipped.sort();
    true
}

pub fn remove_skip(skipped: &mut Vec<DateTime<Utc>>, original_start: DateTime<Utc>) -> bool {
    let key = minute(original_start);
    let before = skipped.len();
    skipped.retain(|s| minute(*s) != key);
    skipped.len() != before
}

/// Insert or replace the override of one planned start
pub fn upsert_override(overrides: &mut Vec<OccurrenceOverride>, mut entry: OccurrenceOverride) {
    entry.original_start = minute(entry.original_start);
    overrides.retain(|o| minute(o.original_start) != entry.original_start);
    overrides.push(entry);
    overrides.sort_by_key(|o| o.original_start);
}

pub fn remove_override(overrides: &mut Vec<OccurrenceOverride>, original_start: DateTime<Utc>) -> bool {
    let key = minute(original_start);
    let before = overrides.len();
    overrides.retain(|o| minute(o.original_start) != key);
    overrides.len() != before
}

#[derive(Clone)]
pub struct AutoCustomersService {
    repository: Repository,
}

impl AutoCustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &AutoCustomerQuery) -> AppResult<Vec<AutoCustomer>> {
        self.repository.auto_customers.list(query).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<AutoCustomer> {
        self.repository.auto_customers.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateAutoCustomer) -> AppResult<AutoCustomer> {
        check_bounds(data.start_from, data.until)?;
        self.repository.auto_customers.create(data).await
    }

    pub async fn update(&self, id: Uuid, data: &UpdateAutoCustomer) -> AppResult<AutoCustomer> {
        let current = self.repository.auto_customers.get_by_id(id).await?;
        check_update(&current, data)?;
        self.repository.auto_customers.update(id, data).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.auto_customers.delete(id).await
    }

    pub async fn skip(&self, id: Uuid, original_start: DateTime<Utc>) -> AppResult<AutoCustomer> {
        let mut customer = self.repository.auto_customers.get_by_id(id).await?;
        if !add_skip(&mut customer.skipped, original_start) {
            return Ok(customer);
        }
        self.repository
            .auto_customers
            .set_exceptions(id, &customer.skipped, &customer.overrides)
            .await
    }

    pub async fn unskip(&self, id: Uuid, original_start: DateTime<Utc>) -> AppResult<AutoCustomer> {
        let mut customer = self.repository.auto_customers.get_by_id(id).await?;
        if !remove_skip(&mut customer.skipped, original_start) {
            return Err(AppError::NotFound(format!("No skip at {}", original_start)));
        }
        self.repository
            .auto_customers
            .set_exceptions(id, &customer.skipped, &customer.overrides)
            .await
    }

    pub async fn set_override(&self, id: Uuid, entry: OccurrenceOverride) -> AppResult<AutoCustomer> {
        let mut customer = self.repository.auto_customers.get_by_id(id).await?;
        upsert_override(&mut customer.overrides, entry);
        self.repository
            .auto_customers
            .set_exceptions(id, &customer.skipped, &customer.overrides)
            .await
    }

    pub async fn clear_override(&self, id: Uuid, original_start: DateTime<Utc>) -> AppResult<AutoCustomer> {
        let mut customer = self.repository.auto_customers.get_by_id(id).await?;
        if !remove_override(&mut customer.overrides, original_start) {
            return Err(AppError::NotFound(format!("No override at {}", original_start)));
        }
        self.repository
            .auto_customers
            .set_exceptions(id, &customer.skipped, &customer.overrides)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::occurrences::tests::{customer, date, utc};

    #[test]
    fn test_skips_are_minute_keyed() {
        let mut skipped = Vec::new();
        assert!(add_skip(&mut skipped, utc(2024, 1, 8, 9, 0) + Duration::seconds(42)));
        assert!(!add_skip(&mut skipped, utc(2024, 1, 8, 9, 0)));
        assert_eq!(skipped, vec![utc(2024, 1, 8, 9, 0)]);
        assert!(remove_skip(&mut skipped, utc(2024, 1, 8, 9, 0) + Duration::seconds(5)));
        assert!(skipped.is_empty());
        assert!(!remove_skip(&mut skipped, utc(2024, 1, 8, 9, 0)));
    }

    #[test]
    fn test_override_replaces_previous_entry() {
        let mut overrides = Vec::new();
        let entry = |hour| OccurrenceOverride {
            original_start: utc(2024, 1, 15, 9, 0),
            override_start: utc(2024, 1, 16, hour, 0),
            duration_min: None,
            barber: None,
        };
        upsert_override(&mut overrides, entry(10));
        upsert_override(&mut overrides, entry(11));
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].override_start, utc(2024, 1, 16, 11, 0));
        assert!(remove_override(&mut overrides, utc(2024, 1, 15, 9, 0)));
        assert!(overrides.is_empty());
    }

    fn update(body: serde_json::Value) -> UpdateAutoCustomer {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_update_can_keep_set_or_clear_limits() {
        let kept = update(serde_json::json!({ "name": "Jordan" }));
        assert_eq!((kept.until, kept.max_occurrences), (None, None));

        let cleared = update(serde_json::json!({ "until": null, "max_occurrences": null }));
        assert_eq!((cleared.until, cleared.max_occurrences), (Some(None), Some(None)));

        let set = update(serde_json::json!({ "until": "2024-03-01", "max_occurrences": 3 }));
        assert_eq!(set.until, Some(Some(date(2024, 3, 1))));
        assert_eq!(set.max_occurrences, Some(Some(3)));
    }

    #[test]
    fn test_update_checks_merged_bounds() {
        let mut current = customer(1, "09:00", 1, date(2024, 1, 10));
        current.until = Some(date(2024, 2, 1));

        assert!(check_update(&current, &update(serde_json::json!({ "start_from": "2024-03-01" }))).is_err());
        assert!(check_update(
            &current,
            &update(serde_json::json!({ "start_from": "2024-03-01", "until": null }))
        )
        .is_ok());
        assert!(check_update(&current, &update(serde_json::json!({ "max_occurrences": 0 }))).is_err());
        assert!(check_update(&current, &update(serde_json::json!({ "max_occurrences": null }))).is_ok());
    }

    #[test]
    fn test_until_must_not_precede_start() {
        assert!(check_bounds(date(2024, 1, 10), Some(date(2024, 1, 9))).is_err());
        assert!(check_bounds(date(2024, 1, 10), Some(date(2024, 1, 10))).is_ok());
        assert!(check_bounds(date(2024, 1, 10), None).is_ok());
    }
}
