use serde::{Deserialize, Serialize};

use super::response::UserResponse;

/// Envelope every successful response is wrapped in.
#[derive(Debug, Deserialize, Serialize)]
pub struct DataWrapper<T> {
    pub data: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PagedWrapper<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserPayload {
    pub user: UserResponse,
}

impl<T> DataWrapper<T> {
    pub fn wrap(data: T) -> DataWrapper<T> {
        DataWrapper { data }
    }
}
