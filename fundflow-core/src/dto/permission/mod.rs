//! Permission and validation DTOs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::permission::Permission;

/// Effective permissions of the current user on a specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<Permission>,
}

/// Body of a 400 response: field name to messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}
