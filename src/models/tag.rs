use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::non_empty;
use crate::error::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInput {
    pub name: String,
    pub color: Option<String>,
}

impl TagInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_required("name", &self.name, 50, "Name is required");
        errors.check_max("color", self.color.as_deref(), 20);
        errors.into_result()
    }

    pub fn into_tag(self) -> Tag {
        let mut tag = Tag::new(self.name.trim().to_string());
        tag.color = non_empty(self.color);
        tag
    }
}
