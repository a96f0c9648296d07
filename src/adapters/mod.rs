//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements               | Connects to                |
//! |---------------|--------------------------|----------------------------|
//! | `json_config` | ConfigPort               | JSON file on disk          |
//! | `log_sink`    | EventSink                | `log` facade               |
//! | `time`        | ClockPort                | Wall clock / manual clock  |
//! | `tools`       | ForecastPort, InsightPort| Nothing (absent providers) |

pub mod json_config;
pub mod log_sink;
pub mod time;
pub mod tools;
