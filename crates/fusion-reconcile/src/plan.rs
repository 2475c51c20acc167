//! Choosing which artifacts a removal request covers

use fusion_ident::FusionId;
use fusion_store::{Authorship, Ledger};

/// What the operator asked to remove
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalRequest {
    pub username: String,
    /// Also remove artifacts credited to the user together with others
    pub include_collabs: bool,
    /// Restrict removal to these identifiers
    pub only: Option<Vec<String>>,
    /// Copy files and ledger rows aside before removing
    pub preserve_data: bool,
}

impl RemovalRequest {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_collabs(mut self, include: bool) -> Self {
        self.include_collabs = include;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_only<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.only = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_backup(mut self, preserve: bool) -> Self {
        self.preserve_data = preserve;
        self
    }

    fn lists(&self, identifier: &str) -> bool {
        self.only
            .as_ref()
            .is_some_and(|only| only.iter().any(|o| o == identifier))
    }
}

/// Selected targets plus everything left out and why
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    /// In ledger order
    pub targets: Vec<FusionId>,
    /// Collaborations skipped without `include_collabs`
    pub held_back: Vec<String>,
    /// Attributions naming the user unclearly, never removed unless listed
    pub ambiguous: Vec<String>,
    /// Listed in `only` but not attributed to the user
    pub not_found: Vec<String>,
    /// Selected rows whose identifier does not parse
    pub malformed: Vec<String>,
}

impl RemovalPlan {
    /// Select the user's artifacts from the ledger
    #[must_use]
    pub fn build(ledger: &Ledger, request: &RemovalRequest) -> Self {
        let mut plan = Self::default();
        let mut selected: Vec<&str> = Vec::new();

        for (record, authorship) in ledger.attributed_to(&request.username) {
            let id = record.identifier.as_str();
            let listed = request.lists(id);
            match authorship {
                Authorship::Sole => selected.push(id),
                Authorship::Collab if request.include_collabs || listed => selected.push(id),
                Authorship::Collab => plan.held_back.push(id.to_string()),
                Authorship::Ambiguous if listed => selected.push(id),
                Authorship::Ambiguous => plan.ambiguous.push(id.to_string()),
                Authorship::Unrelated => {}
            }
        }

        if let Some(only) = &request.only {
            selected.retain(|id| only.iter().any(|o| o == id));
            // anything unlisted is out of scope, not held back
            plan.held_back.clear();
            plan.ambiguous.clear();
            plan.not_found = only
                .iter()
                .filter(|o| !selected.contains(&o.as_str()))
                .cloned()
                .collect();
        }

        for id in selected {
            match id.parse::<FusionId>() {
                Ok(parsed) if !plan.targets.contains(&parsed) => plan.targets.push(parsed),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(identifier = id, error = %e, "skipping malformed identifier");
                    plan.malformed.push(id.to_string());
                }
            }
        }
        plan
    }

    /// Log what was left out
    pub fn log_exclusions(&self, username: &str) {
        if !self.held_back.is_empty() {
            tracing::warn!(
                username,
                ids = ?self.held_back,
                "collaborations kept; pass --collabs to remove them"
            );
        }
        if !self.ambiguous.is_empty() {
            tracing::warn!(
                username,
                ids = ?self.ambiguous,
                "attribution unclear; list explicitly with --only to remove"
            );
        }
        if !self.not_found.is_empty() {
            tracing::warn!(username, ids = ?self.not_found, "not attributed to user");
        }
    }
}
