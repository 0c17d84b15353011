use serde::{Deserialize, Serialize};

use crate::domain::{Activity, Contact, Customer, Opportunity};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithContacts {
    #[serde(flatten)]
    pub customer: Customer,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithOpportunities {
    #[serde(flatten)]
    pub customer: Customer,
    pub opportunities: Vec<Opportunity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWithActivities {
    #[serde(flatten)]
    pub contact: Contact,
    pub activities: Vec<Activity>,
}

/// Options for converting a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertLead {
    /// Also open a customer with the lead as its primary contact, unless
    /// the lead already points at one.
    #[serde(default)]
    pub create_customer: bool,
}
