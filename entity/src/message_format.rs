use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a client should render a message's `content`.
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
pub enum MessageFormat {
    #[sea_orm(string_value = "text")]
    #[default]
    Text,
    /// `content` holds an image data URL.
    #[sea_orm(string_value = "image")]
    Image,
}

impl std::fmt::Display for MessageFormat {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageFormat::Text => write!(fmt, "text"),
            MessageFormat::Image => write!(fmt, "image"),
        }
    }
}
