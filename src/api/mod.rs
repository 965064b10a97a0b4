//! Public entry points: dispatcher, per-chart engine, host shell and the
//! JSON contract hosts speak.

mod bindings;
mod dispatcher;
mod engine;
mod host;
mod json_contract;

pub use bindings::{check_bindings, missing_bindings};
pub use dispatcher::{NO_DATA_MESSAGE, RenderOutcome, render, render_with};
pub use engine::ChartEngine;
pub use host::{ChartHost, ExportOptions, HostState, LOADING_MESSAGE};
pub use json_contract::{
    RENDER_REQUEST_JSON_SCHEMA_V1, RenderRequest, RenderRequestJsonContractV1,
    parse_configuration, parse_rows,
};
