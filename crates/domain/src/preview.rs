use serde::{Deserialize, Serialize};

/// Identifier of the user requesting a preview
///
/// Each requester gets its own draft file so concurrent previews by different
/// users never write to the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(i64);

impl RequesterId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// File name of this requester's rendered draft (e.g. `draft-23479234.png`)
    pub fn draft_file_name(&self) -> String {
        format!("draft-{}.png", self.0)
    }
}

impl From<i64> for RequesterId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
