use std::collections::BTreeMap;

/// Free-form attribution fields forwarded to the provider as `fields`
/// (e.g. `site_url`, `source`).
pub type Metadata = BTreeMap<String, String>;

/// A lead as handed over by the hosting layer. The email is still raw; the
/// bridge parses it before doing anything else.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRequest {
    pub email: String,
    /// Provider form id; `None` (or blank) means "use the configured default"
    pub list_id: Option<String>,
    pub metadata: Metadata,
}

impl SubscriptionRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_list_id(
        mut self,
        list_id: impl Into<String>,
    ) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The explicit list id, if one was given that isn't blank
    pub fn list_id_override(&self) -> Option<&str> {
        self.list_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
