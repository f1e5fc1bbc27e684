pub mod types;
pub mod classifier;
pub mod matcher;
pub mod texts;

pub use types::{
    Message,
    MessageId,
    Sender,
    DepartmentDirectory,
    UpdateProgress,
    UpdateStatus,
};

pub use classifier::{Classification, PatternTable, QueryClassifier, PATTERN_TABLE_VERSION};
pub use matcher::{core_name, department_question, DepartmentMatcher};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
