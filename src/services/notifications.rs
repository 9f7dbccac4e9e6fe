//! Confirmation messages for booked appointments

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use super::sms::{Notifier, SendReceipt};
use crate::{
    error::{AppError, AppResult},
    models::{calendar_event::NotificationAttempt, CalendarEvent, SmsStatus},
    repository::CalendarStore,
    scheduler::{BatchRecorder, SmsOutcome},
};

const CONFIRMATION: &str = "confirmation";

/// Appointments of one customer with one barber, notified together
struct NotificationGroup {
    name: String,
    phone: Option<String>,
    barber: String,
    event_ids: Vec<Uuid>,
    starts: Vec<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    shop_name: String,
    offset: FixedOffset,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, shop_name: String, offset: FixedOffset, timeout: Duration) -> Self {
        Self {
            notifier,
            shop_name,
            offset,
            timeout,
        }
    }

    /// One message listing every date, in shop local time
    pub fn compose_confirmation(&self, name: &str, barber: &str, starts: &[DateTime<Utc>]) -> String {
        let dates: Vec<String> = starts
            .iter()
            .map(|s| s.with_timezone(&self.offset).format("%a %d %b %H:%M").to_string())
            .collect();
        let noun = if dates.len() == 1 { "appointment" } else { "appointments" };
        format!(
            "Hi {}, your {} at {} with {}: {}. Reply to this message to change.",
            name,
            noun,
            self.shop_name,
            barber,
            dates.join(", ")
        )
    }

    /// Send one message and classify the result. Timeouts count as failures.
    async fn deliver(&self, phone: Option<&str>, message: &str) -> (SmsOutcome, Option<String>) {
        if !self.notifier.is_enabled() {
            return (
                SmsOutcome {
                    status: SmsStatus::Disabled,
                    reason: Some("sms-disabled".to_string()),
                    error: None,
                },
                None,
            );
        }
        let phone = match phone.map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => phone,
            None => {
                return (
                    SmsOutcome {
                        status: SmsStatus::MissingPhone,
                        reason: Some("missing-phone".to_string()),
                        error: None,
                    },
                    None,
                )
            }
        };

        let failed = |error: String| SmsOutcome {
            status: SmsStatus::Failed,
            reason: None,
            error: Some(error),
        };

        match tokio::time::timeout(self.timeout, self.notifier.send(phone, message)).await {
            Ok(Ok(SendReceipt { success: true, message_id, .. })) => (
                SmsOutcome {
                    status: SmsStatus::Sent,
                    reason: None,
                    error: None,
                },
                message_id,
            ),
            Ok(Ok(receipt)) => (
                failed(receipt.error.unwrap_or_else(|| "Provider rejected the message".to_string())),
                receipt.message_id,
            ),
            Ok(Err(e)) => (failed(e.to_string()), None),
            Err(_) => (failed(format!("timed out after {}s", self.timeout.as_secs())), None),
        }
    }

    /// Notify every customer with appointments created by the run.
    ///
    /// Failures are recorded on the summary and the events; they never
    /// abort the pass.
    pub async fn notify_batch(&self, recorder: &mut BatchRecorder, calendar: &dyn CalendarStore) {
        let mut groups: IndexMap<(Uuid, String), NotificationGroup> = IndexMap::new();
        for created in recorder.created() {
            let group = groups
                .entry((created.customer_id, created.barber.clone()))
                .or_insert_with(|| NotificationGroup {
                    name: created.customer_name.clone(),
                    phone: created.phone.clone(),
                    barber: created.barber.clone(),
                    event_ids: Vec::new(),
                    starts: Vec::new(),
                });
            group.event_ids.push(created.event_id);
            group.starts.push(created.start);
        }

        for group in groups.into_values() {
            let message = self.compose_confirmation(&group.name, &group.barber, &group.starts);
            let (outcome, message_id) = self.deliver(group.phone.as_deref(), &message).await;

            match outcome.status {
                SmsStatus::Sent => tracing::info!("Confirmation sent to {} ({} dates)", group.name, group.starts.len()),
                SmsStatus::Failed => tracing::warn!(
                    "Confirmation to {} failed: {}",
                    group.name,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
                _ => tracing::debug!("Confirmation to {} skipped: {}", group.name, outcome.status),
            }

            if outcome.status != SmsStatus::Disabled {
                let attempt = NotificationAttempt {
                    kind: CONFIRMATION.to_string(),
                    sent_at: Utc::now(),
                    message_id,
                    status: outcome.status,
                    retry_count: 0,
                    error: outcome.error.clone(),
                };
                if let Err(e) = calendar.append_notification(&group.event_ids, &attempt).await {
                    tracing::error!("Failed to log notification for {}: {}", group.name, e);
                }
            }

            recorder.record_sms(&group.event_ids, &outcome);
        }
    }

    /// Send the confirmation of a single appointment again
    pub async fn resend_confirmation(
        &self,
        event: &CalendarEvent,
        calendar: &dyn CalendarStore,
    ) -> AppResult<NotificationAttempt> {
        let name = event.customer_name.as_deref().unwrap_or("there");
        if !self.notifier.is_enabled() {
            return Err(AppError::BadRequest("SMS delivery is disabled".to_string()));
        }
        if event.customer_phone.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::BadRequest("Appointment has no phone number".to_string()));
        }

        let message = self.compose_confirmation(name, &event.barber, &[event.start]);
        let (outcome, message_id) = self.deliver(event.customer_phone.as_deref(), &message).await;

        let retry_count = event
            .notifications
            .iter()
            .filter(|n| n.kind == CONFIRMATION)
            .map(|n| n.retry_count + 1)
            .max()
            .unwrap_or(0);

        let attempt = NotificationAttempt {
            kind: CONFIRMATION.to_string(),
            sent_at: Utc::now(),
            message_id,
            status: outcome.status,
            retry_count,
            error: outcome.error,
        };
        calendar.append_notification(&[event.id], &attempt).await?;
        Ok(attempt)
    }
}
