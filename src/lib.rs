//! plotdeck: renderer-agnostic chart layout engine.
//!
//! One declarative `ChartConfiguration` plus tabular rows go in; a positioned,
//! layered `RenderFrame` comes out, ready for the SVG, null or Cairo backends
//! and for the export pipeline.

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod telemetry;

pub use api::{ChartEngine, ChartHost, HostState, RenderOutcome, RenderRequest, render, render_with};
pub use config::{ChartConfiguration, ChartType, LayoutTuning};
pub use core::{DataRow, DataValue};
pub use error::{ChartError, ChartResult, ExportError};
pub use export::{ExportArtifact, ExportFormat, ExportJob, ExportRequest};
pub use layout::{LayoutContext, LayoutResult};
