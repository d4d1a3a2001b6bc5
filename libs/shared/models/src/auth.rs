use serde::{Deserialize, Serialize};

/// Identity every bearer token resolves to until real token validation exists.
pub const STUB_USER_ID: &str = "user-123";

/// Caller identity attached to a request by the auth extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn stub() -> Self {
        Self {
            id: STUB_USER_ID.to_string(),
        }
    }
}
