use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BusinessInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
}
