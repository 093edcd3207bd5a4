use crate::work_item::ItemKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No SLA rule for {kind} category {category:?} (item '{item_id}')")]
    UnmappedCategory {
        item_id:  String,
        kind:     ItemKind,
        category: Option<String>,
    },

    #[error("SLA window for {kind} category {category:?} must be greater than zero")]
    InvalidWindow {
        kind:     ItemKind,
        category: Option<String>,
    },

    #[error("Duplicate SLA rule for {kind} category {category:?}")]
    DuplicateRule {
        kind:     ItemKind,
        category: Option<String>,
    },

    #[error("Work item '{item_id}' has an unreadable {field} timestamp")]
    InvalidTimestamp { item_id: String, field: &'static str },

    #[error("Unknown work item kind '{0}'")]
    UnknownKind(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlaError {
    /// True for errors that stem from rule/threshold configuration rather
    /// than from storage or encoding.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnmappedCategory { .. }
                | Self::InvalidWindow { .. }
                | Self::DuplicateRule { .. }
                | Self::InvalidConfig(_)
        )
    }
}

pub type SlaResult<T> = Result<T, SlaError>;
