//! HTTP 미들웨어 모듈.

pub mod metrics;

pub use metrics::metrics_layer;
