//! Birthday event encoding and decoding (RFC 5545).

mod generate;
mod parse;
mod recurrence;

use crate::config::{AppConfig, EventConfig};

pub use parse::DecodedEvent;
pub use recurrence::{next_occurrence, yearly_rule};

/// Media type of calendar object resources.
pub const CALENDAR_MEDIA_TYPE: &str = "text/calendar";

/// Builds birthday events for contacts and reads managed ones back.
#[derive(Debug, Clone)]
pub struct EventCodec {
    event: EventConfig,
    category: String,
    prod_id: String,
}

impl EventCodec {
    pub fn new(
        event: EventConfig,
        category: impl Into<String>,
        prod_id: impl Into<String>,
    ) -> Self {
        EventCodec {
            event,
            category: category.into(),
            prod_id: prod_id.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.event.clone(),
            config.sync.category.clone(),
            config.sync.prod_id.clone(),
        )
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}
