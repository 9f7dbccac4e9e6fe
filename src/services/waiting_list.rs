//! Waiting list service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        waiting_list::{CreateWaitingListEntry, UpdateWaitingListEntry, WaitingListQuery},
        WaitingListEntry,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct WaitingListService {
    repository: Repository,
}

impl WaitingListService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &WaitingListQuery) -> AppResult<Vec<WaitingListEntry>> {
        self.repository.waiting_list.list(query).await
    }

    pub async fn create(&self, data: &CreateWaitingListEntry) -> AppResult<WaitingListEntry> {
        self.repository.waiting_list.create(data).await
    }

    pub async fn update(&self, id: Uuid, data: &UpdateWaitingListEntry) -> AppResult<WaitingListEntry> {
        self.repository.waiting_list.update(id, data).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.waiting_list.delete(id).await
    }
}
