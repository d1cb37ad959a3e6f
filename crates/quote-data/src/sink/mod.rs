//! 시계열 메트릭 싱크.

mod influx;
pub mod line_protocol;

pub use influx::{InfluxConfig, InfluxSink};
