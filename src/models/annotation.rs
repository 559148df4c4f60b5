use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Annotation: Free-text note attached to a geography
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub geo: String,
    pub text: String,
    pub author: String,
    pub created_at: String,
}
