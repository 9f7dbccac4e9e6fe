//! Customers and customer notes repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, CreateCustomerNote, CustomerQuery, UpdateCustomer},
        patterns::normalize_phone,
        Customer, CustomerNote,
    },
};

#[derive(Clone)]
pub struct CustomersRepository {
    pool: Pool<Postgres>,
}

impl CustomersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List customers with optional search and pagination
    pub async fn list(&self, query: &CustomerQuery) -> AppResult<(Vec<Customer>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 500);
        let offset = (page - 1) * per_page;
        let pattern = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE $1::text IS NULL OR LOWER(name) LIKE $1 OR phone LIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE $1::text IS NULL OR LOWER(name) LIKE $1 OR phone LIKE $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Get customer by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    /// Create a customer
    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, phone, email, preferred_barber, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(data.phone.as_deref().map(normalize_phone))
        .bind(&data.email)
        .bind(&data.preferred_barber)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update a customer
    pub async fn update(&self, id: Uuid, data: &UpdateCustomer) -> AppResult<Customer> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() { sets.push(format!("{} = ${}", $name, idx)); idx += 1; }
            };
        }

        add_f!(data.name, "name");
        add_f!(data.phone, "phone");
        add_f!(data.email, "email");
        add_f!(data.preferred_barber, "preferred_barber");
        add_f!(data.notes, "notes");

        let query = format!(
            "UPDATE customers SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let phone = data.phone.as_deref().map(normalize_phone);
        let mut builder = sqlx::query_as::<_, Customer>(&query);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field { builder = builder.bind(val); }
            };
        }

        bind_f!(data.name);
        bind_f!(phone);
        bind_f!(data.email);
        bind_f!(data.preferred_barber);
        bind_f!(data.notes);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    /// Delete a customer and their notes
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Customer {} not found", id)));
        }
        Ok(())
    }

    // ---- Notes ----

    pub async fn list_notes(&self, customer_id: Uuid) -> AppResult<Vec<CustomerNote>> {
        let rows = sqlx::query_as::<_, CustomerNote>(
            "SELECT * FROM customer_notes WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_note(
        &self,
        customer_id: Uuid,
        author: &str,
        data: &CreateCustomerNote,
    ) -> AppResult<CustomerNote> {
        let row = sqlx::query_as::<_, CustomerNote>(
            r#"
            INSERT INTO customer_notes (id, customer_id, author, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(author)
        .bind(data.body.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_note(&self, customer_id: Uuid, note_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customer_notes WHERE id = $1 AND customer_id = $2")
            .bind(note_id)
            .bind(customer_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Note {} not found", note_id)));
        }
        Ok(())
    }
}
