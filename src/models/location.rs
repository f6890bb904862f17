use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical storage point (warehouse × sub-location). Purely a dimension
/// on the pool key; it carries no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub warehouse: String,
    pub name: String,
}

impl Location {
    pub fn new(id: Uuid, warehouse: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            warehouse: warehouse.into(),
            name: name.into(),
        }
    }
}
