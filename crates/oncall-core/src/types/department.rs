use serde::{Deserialize, Serialize};

/// Names used when the backend cannot provide a department list.
pub const FALLBACK_DEPARTMENTS: [&str; 6] = [
    "순환기내과",
    "외과",
    "정형외과",
    "응급의학과",
    "내과",
    "소아과",
];

/// Ordered set of department names known to the client.
///
/// Names are unique; order is the order the backend returned them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentDirectory {
    names: Vec<String>,
}

impl DepartmentDirectory {
    /// Build from a backend list, keeping the first occurrence of each name
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// The fixed six-name default list
    pub fn fallback() -> Self {
        Self::new(FALLBACK_DEPARTMENTS)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 1-based lookup, as shown in numbered listings
    pub fn get_numbered(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }
}
