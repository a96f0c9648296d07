//! Tool adapters for deployments without external providers.
//!
//! [`NoTool`] answers every tool call with [`ToolError::Unavailable`], which
//! the service treats as "no signal" without flagging a degradation.
//! [`StaticForecast`] returns a fixed outlook, useful for bench setups.

use crate::app::ports::{ForecastPort, InsightPort, InsightRequest, RainForecast};
use crate::error::ToolError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoTool;

impl ForecastPort for NoTool {
    async fn rain_forecast(&self, _device_id: &str) -> Result<RainForecast, ToolError> {
        Err(ToolError::Unavailable("forecast"))
    }
}

impl InsightPort for NoTool {
    async fn insight(&self, _request: &InsightRequest) -> Result<String, ToolError> {
        Err(ToolError::Unavailable("insight"))
    }
}

/// Forecast provider that always returns the same answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticForecast(pub RainForecast);

impl ForecastPort for StaticForecast {
    async fn rain_forecast(&self, _device_id: &str) -> Result<RainForecast, ToolError> {
        Ok(self.0)
    }
}
