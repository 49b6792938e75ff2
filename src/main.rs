// Main entry point - Dependency injection and the selection loop
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::application::chart_renderer::ChartRenderer;
use crate::application::dataset_service::DatasetService;
use crate::application::selection_controller::{SelectionController, SelectionEvent};
use crate::domain::error::ChartError;
use crate::domain::scale::ScaleBuilder;
use crate::infrastructure::config::load_chart_config;
use crate::infrastructure::csv_source::CsvDatasetSource;
use crate::infrastructure::svg_surface::{SvgSurface, empty_state_document, write_document};
use crate::presentation::selection_input::{forward_selection_events, serve_selections};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = load_chart_config("config/chart")?;

    // Create dataset source (infrastructure layer)
    let source = Arc::new(CsvDatasetSource::new(
        config.dataset.path.clone(),
        config.dataset.date_column.clone(),
        config.dataset.value_column.clone(),
        config.dataset.category_column.clone(),
    ));

    // Load, normalize and group (application layer). Nothing renders until
    // this has finished.
    let dataset_service =
        DatasetService::new(source, config.normalizer(), config.dataset.on_malformed);
    let dataset = dataset_service.load().await.inspect_err(|e| {
        tracing::error!("Dataset load failed: {:#}", e);
    })?;

    let empty_frame = config.empty_frame();
    let scales = match ScaleBuilder::build(
        &dataset,
        empty_frame.inner_width(),
        empty_frame.inner_height(),
        &config.style.palette,
    ) {
        Ok(scales) => scales,
        Err(ChartError::EmptyDataset) => {
            tracing::error!("No usable records in {}", config.dataset.path.display());
            let document = empty_state_document(&empty_frame, "No data to chart");
            write_document(&config.output.path, &document).await?;
            return Err(ChartError::EmptyDataset.into());
        }
        Err(e) => return Err(e.into()),
    };

    let (start, end) = scales.time.domain();
    let (low, high) = scales.value.domain();
    tracing::info!("Scales cover {} to {}, values {:.1} to {:.1}", start, end, low, high);
    let mut vars = HashMap::new();
    vars.insert(
        "start".to_string(),
        start.format(&config.chart.label_date_format).to_string(),
    );
    vars.insert(
        "end".to_string(),
        end.format(&config.chart.label_date_format).to_string(),
    );

    let renderer = ChartRenderer::new(
        SvgSurface::new(),
        dataset,
        scales,
        config.frame(&vars),
        config.render_options(),
    );
    let mut controller = SelectionController::new(renderer);
    tracing::info!("Selectable categories: {:?}", controller.options());

    // Initial selection goes through the same path as every later change
    let (tx, rx) = mpsc::channel(32);
    tx.send(SelectionEvent::new(config.chart.initial_selection.clone()))
        .await?;
    tokio::spawn(async move {
        if let Err(e) = forward_selection_events(tokio::io::stdin(), tx).await {
            tracing::error!("Selection input failed: {:#}", e);
        }
    });

    tracing::info!(
        "Writing chart to {}; send JSON arrays of categories on stdin",
        config.output.path.display()
    );
    let handled = serve_selections(&mut controller, rx, &config.output.path).await?;
    tracing::info!(
        "Input closed after {} selections, showing {:?}",
        handled,
        controller.renderer().rendered_keys()
    );

    Ok(())
}
