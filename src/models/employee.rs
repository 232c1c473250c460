use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;
#[cfg(test)]
use chrono::Datelike;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HiredEmployee {
    pub id: i32,
    pub name: String,
    pub hired_at: NaiveDateTime,
    pub department_id: i32,
    pub job_id: i32,
}

#[cfg(test)]
impl HiredEmployee {
    /// Calendar quarter of the hire date, 1 through 4.
    pub fn quarter(&self) -> u32 {
        (self.hired_at.month() - 1) / 3 + 1
    }
}
