pub mod issues;
pub mod search;

/// A GitHub repository identified by its owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Repository {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns the `owner/name` form used in search qualifiers and metric labels.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
