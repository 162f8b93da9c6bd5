//! Simulator configuration with explicit layered precedence.
//!
//! Precedence is data, not incidental struct-literal ordering: a base config
//! plus an ordered slice of [`ConfigLayer`] overlays, applied left to right,
//! later layers winning. Typical layering: engine defaults < research
//! profile < runtime overrides < per-strategy overrides.

use crate::session::{SessionCalendar, SessionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulator config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// When a bar's range contains both the stop and the target, which fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    /// Conservative default: assume the stop traded first.
    #[default]
    StopFirst,
    TargetFirst,
}

/// What to do with trades still open when the candle stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndOfDataPolicy {
    /// Close every open trade at the last seen close, reason EndOfData.
    #[default]
    ForceClose,
    /// Leave them open and report them as open-at-end, with no P&L.
    ReportOpen,
}

/// Which price space the candle stream is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceMode {
    /// Raw front-month prices; calendar-spread translation is a no-op.
    #[default]
    Raw,
    /// Back-adjusted continuous series; reported fill prices are translated
    /// into raw-contract space at settlement.
    ContinuousAdjusted,
}

/// Session-close behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub force_close_at_session_end: bool,
    pub allow_overnight_holds: bool,
    /// IANA zone name, e.g. "America/New_York".
    pub timezone: String,
    /// Wall-clock close, "HH:MM".
    pub close_time: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            force_close_at_session_end: false,
            allow_overnight_holds: true,
            timezone: "America/New_York".into(),
            close_time: "16:00".into(),
        }
    }
}

impl SessionConfig {
    /// Build the calendar, or `None` when forced session close is off.
    pub fn calendar(&self) -> Result<Option<SessionCalendar>, SessionError> {
        if !self.force_close_at_session_end {
            return Ok(None);
        }
        Ok(Some(SessionCalendar::parse(&self.timezone, &self.close_time)?))
    }
}

/// Fully-resolved simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Flat dollar commission per round trip, charged once per completed trade.
    pub commission_per_round_trip: f64,
    /// Slippage in ticks applied at settlement.
    pub slippage_ticks: f64,
    pub tie_break: TieBreak,
    pub end_of_data: EndOfDataPolicy,
    pub price_mode: PriceMode,
    pub session: SessionConfig,
    /// Capacity of the rolling candle window used for swing detection.
    pub swing_window_bars: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            commission_per_round_trip: 0.0,
            slippage_ticks: 0.0,
            tie_break: TieBreak::default(),
            end_of_data: EndOfDataPolicy::default(),
            price_mode: PriceMode::default(),
            session: SessionConfig::default(),
            swing_window_bars: 64,
        }
    }
}

impl SimulatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply one overlay; `None` fields leave the base value untouched.
    pub fn apply(mut self, layer: &ConfigLayer) -> Self {
        if let Some(v) = layer.commission_per_round_trip {
            self.commission_per_round_trip = v;
        }
        if let Some(v) = layer.slippage_ticks {
            self.slippage_ticks = v;
        }
        if let Some(v) = layer.tie_break {
            self.tie_break = v;
        }
        if let Some(v) = layer.end_of_data {
            self.end_of_data = v;
        }
        if let Some(v) = layer.price_mode {
            self.price_mode = v;
        }
        if let Some(ref v) = layer.session {
            self.session = v.clone();
        }
        if let Some(v) = layer.swing_window_bars {
            self.swing_window_bars = v;
        }
        self
    }

    /// Apply overlays in slice order; later layers win.
    pub fn layered(base: Self, layers: &[ConfigLayer]) -> Self {
        layers.iter().fold(base, |acc, layer| acc.apply(layer))
    }
}

/// Partial overlay over [`SimulatorConfig`]. Every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub commission_per_round_trip: Option<f64>,
    pub slippage_ticks: Option<f64>,
    pub tie_break: Option<TieBreak>,
    pub end_of_data: Option<EndOfDataPolicy>,
    pub price_mode: Option<PriceMode>,
    pub session: Option<SessionConfig>,
    pub swing_window_bars: Option<usize>,
}
