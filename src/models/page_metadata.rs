use serde::{Deserialize, Serialize};

/// Best-effort metadata extracted from a rendered product page.
///
/// All four fields are always present — possibly empty, never null — so
/// callers only ever branch on emptiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    /// Image URL, or empty when no image could be found.
    pub image: String,
    /// Raw, unparsed price string as found on the page.
    pub price: String,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.image.is_empty()
            && self.price.is_empty()
    }
}
