use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The persisted customer record. The identifier is assigned by the storage
/// backend on creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// PUT body. Every field of the stored record is overwritten with these
/// values, including fields the caller left out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplaceCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// PATCH body. A present field overwrites the stored value; an absent field
/// keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl PatchCustomerRequest {
    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(name) = self.name {
            customer.name = Some(name);
        }
        if let Some(email) = self.email {
            customer.email = Some(email);
        }
        if let Some(address) = self.address {
            customer.address = Some(address);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}
