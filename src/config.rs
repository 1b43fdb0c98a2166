//! Runtime configuration for the GUI core.
//!
//! The configuration is a plain serde struct so that a board can keep it as a
//! postcard blob in flash next to its other settings.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{GuiError, GuiResult};
use crate::gui::INPUT_QUEUE_CAPACITY;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiConfig {
    /// Maximum number of live widgets, windows included
    pub max_widgets: u16,
    /// Maximum number of live software timers
    pub max_timers: u16,
    /// Whether queued raw input is routed to widgets
    pub touch_enabled: bool,
    /// Maximum raw inputs drained per `process` call
    pub input_budget: u8,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            max_widgets: 64,
            max_timers: 16,
            touch_enabled: true,
            input_budget: INPUT_QUEUE_CAPACITY as u8,
        }
    }
}

impl GuiConfig {
    /// Decode and validate a postcard-encoded configuration
    pub fn from_bytes(bytes: &[u8]) -> GuiResult<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| GuiError::InvalidConfig {
            reason: "malformed postcard data",
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Encode this configuration with postcard
    pub fn to_vec(&self) -> GuiResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| GuiError::InvalidConfig {
            reason: "encoding failed",
        })
    }

    pub fn validate(&self) -> GuiResult<()> {
        if self.max_widgets == 0 {
            return Err(GuiError::InvalidConfig {
                reason: "max_widgets must be at least 1",
            });
        }
        if self.input_budget == 0 {
            return Err(GuiError::InvalidConfig {
                reason: "input_budget must be at least 1",
            });
        }
        Ok(())
    }

    pub fn with_max_widgets(mut self, max_widgets: u16) -> Self {
        self.max_widgets = max_widgets;
        self
    }

    pub fn with_max_timers(mut self, max_timers: u16) -> Self {
        self.max_timers = max_timers;
        self
    }

    pub fn with_touch_enabled(mut self, enabled: bool) -> Self {
        self.touch_enabled = enabled;
        self
    }

    pub fn with_input_budget(mut self, budget: u8) -> Self {
        self.input_budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GuiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_postcard_blob_is_loaded() {
        let config = GuiConfig::default()
            .with_max_widgets(12)
            .with_touch_enabled(false);
        let bytes = config.to_vec().unwrap();

        assert_eq!(GuiConfig::from_bytes(&bytes), Ok(config));
    }

    #[test]
    fn test_zero_widget_capacity_rejected() {
        let bytes = GuiConfig::default().with_max_widgets(0).to_vec().unwrap();

        assert!(matches!(
            GuiConfig::from_bytes(&bytes),
            Err(GuiError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_truncated_blob_rejected() {
        assert!(matches!(
            GuiConfig::from_bytes(&[0x01]),
            Err(GuiError::InvalidConfig { .. })
        ));
    }
}
