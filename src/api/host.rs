use tracing::{debug, warn};

use crate::api::dispatcher::{NO_DATA_MESSAGE, RenderOutcome};
use crate::api::engine::ChartEngine;
use crate::config::ChartConfiguration;
use crate::core::DataRow;
use crate::error::ExportError;
use crate::export::{ExportArtifact, ExportFormat, ExportRequest, default_filename};
use crate::render::Renderer;

pub const LOADING_MESSAGE: &str = "Loading chart...";

/// Display state of a hosted chart. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostState {
    Loading,
    Chart,
    Error(String),
    Empty(String),
}

/// Size and background overrides for a host-level export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<String>,
}

/// Shell around one `ChartEngine`: title chrome, state and export actions.
pub struct ChartHost<R: Renderer> {
    engine: ChartEngine<R>,
    state: HostState,
}

impl<R: Renderer> ChartHost<R> {
    /// Starts in `Loading` until the first `set_data`.
    #[must_use]
    pub fn new(renderer: R, config: ChartConfiguration) -> Self {
        Self {
            engine: ChartEngine::new(renderer, config),
            state: HostState::Loading,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ChartEngine<R> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ChartEngine<R> {
        &mut self.engine
    }

    #[must_use]
    pub fn state(&self) -> &HostState {
        &self.state
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.engine.config().display_title()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.engine
            .config()
            .description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Puts the host back into `Loading`, e.g. while the caller fetches rows.
    pub fn begin_loading(&mut self) {
        self.state = HostState::Loading;
    }

    pub fn set_config(&mut self, config: ChartConfiguration) -> &HostState {
        self.engine.set_config(config);
        self.refresh()
    }

    /// Replaces the rows and re-renders.
    pub fn set_data(&mut self, rows: Vec<DataRow>) -> &HostState {
        self.engine.set_rows(rows);
        self.refresh()
    }

    /// Re-renders the current inputs and updates the state from the outcome.
    pub fn refresh(&mut self) -> &HostState {
        self.state = match self.engine.render() {
            Ok(RenderOutcome::Rendered(_)) => HostState::Chart,
            Ok(RenderOutcome::EmptyData) => HostState::Empty(NO_DATA_MESSAGE.to_owned()),
            Ok(outcome) => HostState::Error(outcome.message()),
            Err(err) => {
                warn!(error = %err, "chart backend failed");
                HostState::Error(format!("Render failed: {err}"))
            }
        };
        debug!(state = ?self.state, "host state updated");
        &self.state
    }

    /// Text for the current state; the four states never share a message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match &self.state {
            HostState::Loading => LOADING_MESSAGE.to_owned(),
            HostState::Chart => self.title().unwrap_or("Chart").to_owned(),
            HostState::Error(message) | HostState::Empty(message) => message.clone(),
        }
    }

    /// Formats offered to the user; empty unless a chart is showing.
    #[must_use]
    pub fn export_menu(&self) -> Vec<ExportFormat> {
        if self.state == HostState::Chart {
            ExportFormat::available()
        } else {
            Vec::new()
        }
    }

    /// Exports the displayed chart under the default filename.
    ///
    /// Failures are returned to the caller and leave the host state as is.
    pub fn export(
        &self,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        if self.state != HostState::Chart {
            return Err(ExportError::NothingRendered);
        }
        let mut request = ExportRequest::new(format, default_filename(self.title(), format));
        request.width = options.width;
        request.height = options.height;
        request.background = options.background.clone();
        self.engine.export(&request).inspect_err(|err| {
            warn!(%format, error = %err, "export failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartHost, ExportOptions, HostState};
    use crate::config::{ChartConfiguration, ChartType};
    use crate::core::DataRow;
    use crate::export::ExportFormat;
    use crate::render::NullRenderer;

    fn host() -> ChartHost<NullRenderer> {
        let config = ChartConfiguration::new(ChartType::Pie)
            .with_category_value("k", "v")
            .with_title("Share");
        ChartHost::new(NullRenderer::default(), config)
    }

    #[test]
    fn states_have_distinct_messages() {
        let mut host = host();
        let loading = host.display_message();

        host.set_data(vec![DataRow::new().with("k", "a").with("v", 3.0)]);
        assert_eq!(host.state(), &HostState::Chart);
        let chart = host.display_message();

        host.set_data(Vec::new());
        let empty = host.display_message();
        assert_eq!(empty, "No data available");

        host.set_config(ChartConfiguration::new(ChartType::Pie));
        host.set_data(vec![DataRow::new().with("k", "a")]);
        let error = host.display_message();
        assert!(matches!(host.state(), HostState::Error(_)));

        let all = [loading, chart, empty, error];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn export_uses_title_and_keeps_state_on_failure() {
        let mut host = host();
        assert!(host.export_menu().is_empty());
        host.set_data(vec![DataRow::new().with("k", "a").with("v", 3.0)]);
        assert!(host.export_menu().contains(&ExportFormat::Svg));

        let artifact = host
            .export(ExportFormat::Svg, &ExportOptions::default())
            .expect("svg export");
        assert_eq!(artifact.filename, "Share.svg");

        let bad = ExportOptions {
            width: Some(0),
            ..ExportOptions::default()
        };
        assert!(host.export(ExportFormat::Svg, &bad).is_err());
        assert_eq!(host.state(), &HostState::Chart);
    }
}
