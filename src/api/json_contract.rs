use serde::{Deserialize, Serialize};

use crate::config::ChartConfiguration;
use crate::core::DataRow;
use crate::error::{ChartError, ChartResult};

pub const RENDER_REQUEST_JSON_SCHEMA_V1: u32 = 1;

/// Configuration plus rows, the unit a host hands over per render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub config: ChartConfiguration,
    #[serde(default)]
    pub rows: Vec<DataRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequestJsonContractV1 {
    pub schema_version: u32,
    pub config: ChartConfiguration,
    #[serde(default)]
    pub rows: Vec<DataRow>,
}

pub fn parse_configuration(input: &str) -> ChartResult<ChartConfiguration> {
    serde_json::from_str(input)
        .map_err(|e| ChartError::InvalidConfig(format!("failed to parse chart configuration: {e}")))
}

pub fn parse_rows(input: &str) -> ChartResult<Vec<DataRow>> {
    serde_json::from_str(input)
        .map_err(|e| ChartError::InvalidData(format!("failed to parse data rows: {e}")))
}

impl RenderRequest {
    #[must_use]
    pub fn new(config: ChartConfiguration, rows: Vec<DataRow>) -> Self {
        Self { config, rows }
    }

    pub fn to_json_contract_v1_pretty(&self) -> ChartResult<String> {
        let payload = RenderRequestJsonContractV1 {
            schema_version: RENDER_REQUEST_JSON_SCHEMA_V1,
            config: self.config.clone(),
            rows: self.rows.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize render request contract v1: {e}"))
        })
    }

    /// Accepts the bare `{config, rows}` form or the versioned contract.
    pub fn from_json_compat_str(input: &str) -> ChartResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse render request json: {e}"))
        })?;
        if value.get("schemaVersion").is_none() {
            return serde_json::from_value(value).map_err(|e| {
                ChartError::InvalidData(format!("failed to parse render request payload: {e}"))
            });
        }
        let payload: RenderRequestJsonContractV1 = serde_json::from_value(value).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse render request contract: {e}"))
        })?;
        if payload.schema_version != RENDER_REQUEST_JSON_SCHEMA_V1 {
            return Err(ChartError::InvalidData(format!(
                "unsupported render request schema version: {}",
                payload.schema_version
            )));
        }
        Ok(Self {
            config: payload.config,
            rows: payload.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderRequest, parse_configuration, parse_rows};
    use crate::config::ChartType;

    #[test]
    fn configuration_uses_host_field_names() {
        let config = parse_configuration(
            r#"{"type":"BOX_PLOT","xAxis":{"field":"group"},"series":[{"field":"v"}],"showOutliers":false}"#,
        )
        .expect("config");
        assert_eq!(config.chart_type, ChartType::BoxPlot);
        assert_eq!(config.x_field(), Some("group"));
        assert!(!config.show_outliers);
        assert!(config.show_mean);
    }

    #[test]
    fn rows_must_be_an_array() {
        assert_eq!(parse_rows(r#"[{"a":1},{"a":"x"}]"#).expect("rows").len(), 2);
        assert!(parse_rows(r#"{"a":1}"#).is_err());
    }

    #[test]
    fn versioned_and_bare_requests_parse_alike() {
        let bare = r#"{"config":{"type":"PIE","categoryField":"k","valueField":"v"},"rows":[{"k":"a","v":1}]}"#;
        let request = RenderRequest::from_json_compat_str(bare).expect("bare");
        let versioned = request.to_json_contract_v1_pretty().expect("serialize");
        assert!(versioned.contains("\"schemaVersion\": 1"));
        assert_eq!(RenderRequest::from_json_compat_str(&versioned).expect("versioned"), request);

        let future = versioned.replace("\"schemaVersion\": 1", "\"schemaVersion\": 9");
        assert!(RenderRequest::from_json_compat_str(&future).is_err());
    }
}
