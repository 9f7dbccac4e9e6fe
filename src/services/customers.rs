//! Customers service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        customer::{CreateCustomer, CreateCustomerNote, CustomerQuery, UpdateCustomer},
        Customer, CustomerNote,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
}

impl CustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &CustomerQuery) -> AppResult<(Vec<Customer>, i64)> {
        self.repository.customers.list(query).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Customer> {
        self.repository.customers.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        self.repository.customers.create(data).await
    }

    pub async fn update(&self, id: Uuid, data: &UpdateCustomer) -> AppResult<Customer> {
        self.repository.customers.update(id, data).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.customers.delete(id).await
    }

    /// Notes of a customer, newest first
    pub async fn list_notes(&self, customer_id: Uuid) -> AppResult<Vec<CustomerNote>> {
        self.repository.customers.get_by_id(customer_id).await?;
        self.repository.customers.list_notes(customer_id).await
    }

    pub async fn create_note(
        &self,
        customer_id: Uuid,
        author: &str,
        data: &CreateCustomerNote,
    ) -> AppResult<CustomerNote> {
        self.repository.customers.get_by_id(customer_id).await?;
        self.repository.customers.create_note(customer_id, author, data).await
    }

    pub async fn delete_note(&self, customer_id: Uuid, note_id: Uuid) -> AppResult<()> {
        self.repository.customers.delete_note(customer_id, note_id).await
    }
}
