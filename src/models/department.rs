#[cfg(test)]
use serde::{Deserialize, Serialize};

/// A stored row, as read back by the in-memory test store.
#[cfg(test)]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

/// A department parsed from an upload, waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDepartment {
    pub name: String,
}
