use serde::{Deserialize, Serialize};

pub mod admin;
pub mod catalog;
pub mod health;
pub mod order;

/// Query parameters of the storefront listing pages.
#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct PageParams {
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<u64>,
}
