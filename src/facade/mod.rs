pub mod crm;
pub mod views;

pub use crm::Crm;
pub use views::{ContactWithActivities, ConvertLead, CustomerWithContacts, CustomerWithOpportunities};
