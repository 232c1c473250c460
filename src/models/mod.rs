pub mod department;
pub mod employee;
pub mod job;

use department::NewDepartment;
use employee::HiredEmployee;
use job::NewJob;

/// Width of every name column in the schema.
pub const MAX_NAME_LEN: usize = 50;

/// Anything a store session can queue for the next commit.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRecord {
    Job(NewJob),
    Department(NewDepartment),
    Employee(HiredEmployee),
}

impl From<NewJob> for NewRecord {
    fn from(job: NewJob) -> Self {
        NewRecord::Job(job)
    }
}

impl From<NewDepartment> for NewRecord {
    fn from(department: NewDepartment) -> Self {
        NewRecord::Department(department)
    }
}

impl From<HiredEmployee> for NewRecord {
    fn from(employee: HiredEmployee) -> Self {
        NewRecord::Employee(employee)
    }
}
