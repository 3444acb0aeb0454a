use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Delivery state of a message as seen by its sender.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum MessageState {
    #[sea_orm(string_value = "sent")]
    #[default]
    Sent,
    /// Every other member of the conversation has read it.
    #[sea_orm(string_value = "read")]
    Read,
}

impl std::fmt::Display for MessageState {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageState::Sent => write!(fmt, "sent"),
            MessageState::Read => write!(fmt, "read"),
        }
    }
}
