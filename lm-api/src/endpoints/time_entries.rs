//! Time entry endpoints.

use std::ops::Deref;

use chrono::NaiveDate;

use lm_core::error::LmResult;
use lm_models::{TimeEntry, TimeEntryInput};

use crate::client::ApiClient;
use crate::resource::{ListParams, ResourceClient};

/// `/time_entries`
#[derive(Debug, Clone)]
pub struct TimeEntries {
    resource: ResourceClient<TimeEntry, TimeEntryInput>,
}

impl TimeEntries {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceClient::new(client, "/time_entries"),
        }
    }

    pub async fn list_for_matter(&self, matter_id: i64) -> LmResult<Vec<TimeEntry>> {
        self.resource
            .list_all(&ListParams::new().filter("matter_id", matter_id))
            .await
    }

    /// Entries dated within `[from, to]`, inclusive.
    pub async fn list_in_range(&self, from: NaiveDate, to: NaiveDate) -> LmResult<Vec<TimeEntry>> {
        let params = ListParams::new()
            .filter("start_date", from.format("%Y-%m-%d"))
            .filter("end_date", to.format("%Y-%m-%d"));
        self.resource.list_all(&params).await
    }

    /// Sum of billable amounts for a matter.
    pub async fn billable_total(&self, matter_id: i64) -> LmResult<f64> {
        let entries = self.list_for_matter(matter_id).await?;
        Ok(entries
            .iter()
            .filter(|e| e.billable)
            .map(TimeEntry::amount)
            .sum())
    }
}

impl Deref for TimeEntries {
    type Target = ResourceClient<TimeEntry, TimeEntryInput>;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
