//! Axis ordering of 4-D image activations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where the channel axis sits in a `[batch, ...]` image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLayout {
    /// `[batch, channels, width, height]`
    ChannelsFirst,
    /// `[batch, width, height, channels]`
    ChannelsLast,
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout::ChannelsLast
    }
}

impl DataLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataLayout::ChannelsFirst => "channels_first",
            DataLayout::ChannelsLast => "channels_last",
        }
    }

    /// Axis indices of the (width, height) dimensions.
    pub fn spatial_axes(&self) -> (usize, usize) {
        match self {
            DataLayout::ChannelsFirst => (2, 3),
            DataLayout::ChannelsLast => (1, 2),
        }
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channels_first" | "th" => Ok(DataLayout::ChannelsFirst),
            "channels_last" | "tf" => Ok(DataLayout::ChannelsLast),
            _ => Err(format!("unsupported data layout '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_aliases() {
        assert_eq!("th".parse::<DataLayout>(), Ok(DataLayout::ChannelsFirst));
        assert_eq!("tf".parse::<DataLayout>(), Ok(DataLayout::ChannelsLast));
        assert!("nhwc".parse::<DataLayout>().is_err());
    }

    #[test]
    fn spatial_axes_skip_channel_axis() {
        assert_eq!(DataLayout::ChannelsFirst.spatial_axes(), (2, 3));
        assert_eq!(DataLayout::ChannelsLast.spatial_axes(), (1, 2));
    }
}
