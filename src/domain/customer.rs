use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomerStatus, Entity};
use crate::core::{EntityId, EntityKind, SortValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: EntityId,
    pub company_name: String,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer. Absent status defaults to `ACTIVE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub company_name: String,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl CustomerDraft {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Self::default()
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl Customer {
    pub fn apply_patch(&self, patch: CustomerPatch) -> Customer {
        let mut next = self.clone();
        if let Some(company_name) = patch.company_name {
            next.company_name = company_name.trim().to_string();
        }
        next.industry = patch.industry.or(next.industry);
        next.company_size = patch.company_size.or(next.company_size);
        next.website = patch.website.or(next.website);
        next.phone = patch.phone.or(next.phone);
        next.email = patch.email.or(next.email);
        next.address = patch.address.or(next.address);
        next.city = patch.city.or(next.city);
        next.state = patch.state.or(next.state);
        next.postal_code = patch.postal_code.or(next.postal_code);
        next.country = patch.country.or(next.country);
        if let Some(status) = patch.status {
            next.status = status;
        }
        next
    }
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn sort_key(&self, field: &str) -> Option<SortValue> {
        let value = match field {
            "id" => SortValue::Integer(self.id.get() as i64),
            "companyName" => SortValue::text(&self.company_name),
            "industry" => SortValue::optional_text(self.industry.as_deref()),
            "companySize" => SortValue::optional_text(self.company_size.as_deref()),
            "email" => SortValue::optional_text(self.email.as_deref()),
            "city" => SortValue::optional_text(self.city.as_deref()),
            "state" => SortValue::optional_text(self.state.as_deref()),
            "country" => SortValue::optional_text(self.country.as_deref()),
            "status" => SortValue::Text(self.status.as_str().to_string()),
            "createdAt" => SortValue::Timestamp(self.created_at),
            "updatedAt" => SortValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
