// Selection input - JSON lines in, one render per line out
use crate::application::selection_controller::{SelectionController, SelectionEvent};
use crate::infrastructure::svg_surface::{SvgSurface, write_document};
use anyhow::Context;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

/// Parse one input line. Blank lines carry no event.
pub fn parse_event(line: &str) -> anyhow::Result<Option<SelectionEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(line).context("Expected a JSON array of category labels")?;
    Ok(Some(event))
}

/// Read selection events line by line and forward them in arrival order.
/// Bad lines are logged and skipped.
pub async fn forward_selection_events<R>(
    reader: R,
    tx: mpsc::Sender<SelectionEvent>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = SplitStream::new(BufReader::new(reader).split(b'\n'));
    let mut line_no = 0usize;

    while let Some(bytes) = lines.next().await {
        let bytes = bytes.context("Failed to read selection input")?;
        line_no += 1;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Ignoring selection line {}: not UTF-8 ({})", line_no, e);
                continue;
            }
        };
        match parse_event(line) {
            Ok(Some(event)) => {
                if tx.send(event).await.is_err() {
                    tracing::debug!("Selection consumer closed, stopping input");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring selection line {}: {:#}", line_no, e),
        }
    }

    Ok(())
}

/// Single consumer: every event is rendered and written before the next one
/// is taken off the channel.
pub async fn serve_selections(
    controller: &mut SelectionController<SvgSurface>,
    mut rx: mpsc::Receiver<SelectionEvent>,
    output: &Path,
) -> anyhow::Result<usize> {
    let mut handled = 0;
    while let Some(event) = rx.recv().await {
        let stats = controller.handle(event);
        write_document(output, &controller.renderer().surface().document()).await?;
        handled += 1;
        let surface = controller.renderer().surface();
        tracing::info!(
            "Selection {} rendered: {} lines, {} legend entries ({} added, {} removed)",
            handled,
            surface.lines().len(),
            surface.legend().len(),
            stats.entered,
            stats.exited
        );
    }
    Ok(handled)
}
