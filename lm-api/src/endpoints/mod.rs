//! Resource clients, one module per LawMatics entity.
//!
//! Each wrapper derefs to a [`ResourceClient`](crate::resource::ResourceClient)
//! for the CRUD calls and adds finders specific to its entity.

pub mod addresses;
pub mod contacts;
pub mod custom_contact_types;
pub mod email_addresses;
pub mod events;
pub mod expenses;
pub mod files;
pub mod matters;
pub mod notes;
pub mod payments;
pub mod tasks;
pub mod time_entries;

pub use addresses::Addresses;
pub use contacts::Contacts;
pub use custom_contact_types::CustomContactTypes;
pub use email_addresses::EmailAddresses;
pub use events::Events;
pub use expenses::Expenses;
pub use files::{FileOwner, Files};
pub use matters::Matters;
pub use notes::Notes;
pub use payments::Payments;
pub use tasks::Tasks;
pub use time_entries::TimeEntries;

use crate::client::ApiClient;

impl ApiClient {
    pub fn contacts(&self) -> Contacts {
        Contacts::new(self.clone())
    }

    pub fn matters(&self) -> Matters {
        Matters::new(self.clone())
    }

    pub fn events(&self) -> Events {
        Events::new(self.clone())
    }

    pub fn tasks(&self) -> Tasks {
        Tasks::new(self.clone())
    }

    pub fn time_entries(&self) -> TimeEntries {
        TimeEntries::new(self.clone())
    }

    pub fn expenses(&self) -> Expenses {
        Expenses::new(self.clone())
    }

    pub fn notes(&self) -> Notes {
        Notes::new(self.clone())
    }

    pub fn files(&self) -> Files {
        Files::new(self.clone())
    }

    pub fn payments(&self) -> Payments {
        Payments::new(self.clone())
    }

    pub fn custom_contact_types(&self) -> CustomContactTypes {
        CustomContactTypes::new(self.clone())
    }

    pub fn email_addresses(&self) -> EmailAddresses {
        EmailAddresses::new(self.clone())
    }

    pub fn addresses(&self) -> Addresses {
        Addresses::new(self.clone())
    }
}

/// Client pointed at a throwaway address, for path and query tests.
#[cfg(test)]
pub(crate) fn offline_client() -> ApiClient {
    let mut config = lm_core::config::SdkConfig::default();
    config.api.base_url = "http://localhost:1234".into();
    ApiClient::new(
        &config,
        crate::credentials::Credentials::new("token").expect("token"),
    )
    .expect("client")
}
