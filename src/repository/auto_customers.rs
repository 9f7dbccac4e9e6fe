//! Auto customers repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::AutoCustomerStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        auto_customer::{
            AutoCustomerQuery, AutoCustomerRow, CreateAutoCustomer, UpdateAutoCustomer,
        },
        calendar_event::DEFAULT_DURATION_MIN,
        AutoCustomer, OccurrenceOverride,
    },
};

#[derive(Clone)]
pub struct AutoCustomersRepository {
    pool: Pool<Postgres>,
}

impl AutoCustomersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List auto customers with optional filters
    pub async fn list(&self, query: &AutoCustomerQuery) -> AppResult<Vec<AutoCustomer>> {
        let rows = sqlx::query_as::<_, AutoCustomerRow>(
            r#"
            SELECT * FROM auto_customers
            WHERE ($1::text IS NULL OR barber = $1)
              AND ($2::boolean IS NULL OR active = $2)
            ORDER BY weekday, time_of_day, name
            "#,
        )
        .bind(&query.barber)
        .bind(query.active)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AutoCustomer::from).collect())
    }

    /// Get auto customer by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<AutoCustomer> {
        sqlx::query_as::<_, AutoCustomerRow>("SELECT * FROM auto_customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AutoCustomer::from)
            .ok_or_else(|| AppError::NotFound(format!("Auto customer {} not found", id)))
    }

    /// Create an auto customer
    pub async fn create(&self, data: &CreateAutoCustomer) -> AppResult<AutoCustomer> {
        let row = sqlx::query_as::<_, AutoCustomerRow>(
            r#"
            INSERT INTO auto_customers (
                id, name, phone, barber, weekday, time_of_day, duration_min,
                cadence_weeks, active, paused, start_from, until, max_occurrences, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.barber)
        .bind(data.weekday)
        .bind(&data.time_of_day)
        .bind(data.duration_min.unwrap_or(DEFAULT_DURATION_MIN))
        .bind(data.cadence_weeks.unwrap_or(1))
        .bind(data.active.unwrap_or(true))
        .bind(data.paused.unwrap_or(false))
        .bind(data.start_from)
        .bind(data.until)
        .bind(data.max_occurrences)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Update an auto customer
    pub async fn update(&self, id: Uuid, data: &UpdateAutoCustomer) -> AppResult<AutoCustomer> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() { sets.push(format!("{} = ${}", $name, idx)); idx += 1; }
            };
        }

        add_f!(data.name, "name");
        add_f!(data.phone, "phone");
        add_f!(data.barber, "barber");
        add_f!(data.weekday, "weekday");
        add_f!(data.time_of_day, "time_of_day");
        add_f!(data.duration_min, "duration_min");
        add_f!(data.cadence_weeks, "cadence_weeks");
        add_f!(data.active, "active");
        add_f!(data.paused, "paused");
        add_f!(data.start_from, "start_from");
        add_f!(data.until, "until");
        add_f!(data.max_occurrences, "max_occurrences");
        add_f!(data.notes, "notes");

        let query = format!(
            "UPDATE auto_customers SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, AutoCustomerRow>(&query);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field { builder = builder.bind(val); }
            };
        }

        bind_f!(data.name);
        bind_f!(data.phone);
        bind_f!(data.barber);
        bind_f!(data.weekday);
        bind_f!(data.time_of_day);
        bind_f!(data.duration_min);
        bind_f!(data.cadence_weeks);
        bind_f!(data.active);
        bind_f!(data.paused);
        bind_f!(data.start_from);
        bind_f!(data.until);
        bind_f!(data.max_occurrences);
        bind_f!(data.notes);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AutoCustomer::from)
            .ok_or_else(|| AppError::NotFound(format!("Auto customer {} not found", id)))
    }

    /// Replace the skip list and override list
    pub async fn set_exceptions(
        &self,
        id: Uuid,
        skipped: &[DateTime<Utc>],
        overrides: &[OccurrenceOverride],
    ) -> AppResult<AutoCustomer> {
        sqlx::query_as::<_, AutoCustomerRow>(
            r#"
            UPDATE auto_customers
            SET skipped = $2, overrides = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(skipped))
        .bind(Json(overrides))
        .fetch_optional(&self.pool)
        .await?
        .map(AutoCustomer::from)
        .ok_or_else(|| AppError::NotFound(format!("Auto customer {} not found", id)))
    }

    /// Delete an auto customer; generated appointments stay on the calendar
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM auto_customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Auto customer {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl AutoCustomerStore for AutoCustomersRepository {
    async fn list_for_generation(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<AutoCustomer>> {
        let rows = sqlx::query_as::<_, AutoCustomerRow>(
            r#"
            SELECT * FROM auto_customers
            WHERE active AND ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY created_at
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AutoCustomer::from).collect())
    }

    async fn touch_last_pushed(&self, ids: &[Uuid], at: DateTime<Utc>) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE auto_customers SET last_pushed_at = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
