mod canvas;
mod cell;
mod column;
mod config;
mod engine;
mod error;
mod font;
mod metrics;
mod observer;
mod page_set;
mod pdf;
mod row;
mod scale;
mod style;
mod types;

pub use canvas::{Canvas, Command, Document, Page, StrokeStyle, Surface, TextOptions};
pub use cell::{CellBox, CellContext, draw_borders, draw_cell};
pub use column::{ColumnGroup, ColumnSpec, DEFAULT_COLUMN_WIDTH, column_widths, compute_groups};
pub use config::{BaseConfig, DocumentConfig, MarginSpec, PageConfig, TableConfig};
pub use engine::{DEFAULT_KEEP_LAST_N, EngineState, PageGeometry, TableLayout, TablePaginator};
pub use error::{SourceError, Stage, WideTableError};
pub use font::{DEFAULT_FONT_FAMILY, font_name_for, layout_lines, measure_text_width};
pub use metrics::PaginationMetrics;
pub use observer::{JsonlObserver, PageSetCreated, RowDrawn, RowObserver};
pub use page_set::{
    META_COLUMN_GROUP_KEY, META_PAGE_SET_KEY, PageSet, PageSetId, PageSetManager, PageState,
};
pub use pdf::{document_to_pdf, write_pdf};
pub use row::{Cell, ROW_HEIGHT_FLOOR, RawCell, Row, normalize_row, normalize_row_with};
pub use scale::{SCALABLE_STYLE_FIELDS, calculate_scale_factor, scale_value};
pub use style::{
    BorderSpec, CellStyle, HAlign, LineSide, LineStyle, LineType, LineWidths, Padding,
    PaddingSpec, VAlign,
};
pub use types::{Color, Margins, Orientation, PageFormat, Pt, Size};

use log::info;
use observer::{Fanout, SharedObserver};
use std::convert::Infallible;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Result of rendering straight to a file.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub output: PathBuf,
    pub metrics: PaginationMetrics,
}

/// Renders table configurations to PDF. Page size, margins and font set
/// on the builder take precedence over the configuration document.
pub struct WideTable {
    page_size: Option<Size>,
    margins: Option<Margins>,
    font_family: Option<String>,
    keep_last_n: usize,
    observer: Option<Arc<Mutex<dyn RowObserver + Send>>>,
    debug: Option<JsonlObserver>,
}

#[derive(Clone)]
pub struct WideTableBuilder {
    page_size: Option<Size>,
    margins: Option<Margins>,
    font_family: Option<String>,
    keep_last_n: usize,
    observer: Option<Arc<Mutex<dyn RowObserver + Send>>>,
    debug_path: Option<PathBuf>,
}

impl WideTable {
    pub fn builder() -> WideTableBuilder {
        WideTableBuilder::new()
    }

    /// Parses `json` and renders its first table into `writer`.
    pub fn render_json<W: Write>(
        &self,
        json: &str,
        writer: &mut W,
    ) -> Result<PaginationMetrics, WideTableError> {
        let config = DocumentConfig::from_json(json)?;
        self.render_config(&config, writer)
    }

    pub fn render_config<W: Write>(
        &self,
        config: &DocumentConfig,
        writer: &mut W,
    ) -> Result<PaginationMetrics, WideTableError> {
        let table = config.primary_table()?;
        let rows = table
            .body_rows(&config.base_config)
            .map(Ok::<Row, Infallible>);
        self.render_rows(config, rows, writer)
    }

    /// Renders into memory first; the file is only created on success.
    pub fn render_to_path(
        &self,
        config: &DocumentConfig,
        path: impl AsRef<Path>,
    ) -> Result<RenderOutcome, WideTableError> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        let metrics = self.render_config(config, &mut bytes)?;
        std::fs::write(path, &bytes)?;
        info!("wrote {}", path.display());
        Ok(RenderOutcome {
            output: path.to_path_buf(),
            metrics,
        })
    }

    /// Lays out `config`'s header and page but takes the body from `rows`.
    pub fn render_rows<I, E, W>(
        &self,
        config: &DocumentConfig,
        rows: I,
        writer: &mut W,
    ) -> Result<PaginationMetrics, WideTableError>
    where
        I: IntoIterator<Item = Result<Row, E>>,
        E: Into<SourceError>,
        W: Write,
    {
        let (document, metrics) = self.paginator(config)?.run(rows)?;
        self.write_document(&document, metrics, writer, "render_rows")
    }

    /// Same as `render_rows` with rows arriving over a channel.
    pub async fn render_channel<E, W>(
        &self,
        config: &DocumentConfig,
        rows: async_channel::Receiver<Result<Row, E>>,
        writer: &mut W,
    ) -> Result<PaginationMetrics, WideTableError>
    where
        E: Into<SourceError>,
        W: Write,
    {
        let (document, metrics) = self.paginator(config)?.run_channel(rows).await?;
        self.write_document(&document, metrics, writer, "render_channel")
    }

    fn paginator(&self, config: &DocumentConfig) -> Result<TablePaginator<Canvas>, WideTableError> {
        let table = config.primary_table()?;
        let page_size = self.page_size.unwrap_or_else(|| config.page_size());
        let margins = self
            .margins
            .unwrap_or_else(|| config.base_config.margins());
        let geometry = PageGeometry::from_page(page_size, &margins);
        let mut layout = table.layout(&config.base_config, geometry.printable_width)?;
        if let Some(family) = self.font_family.as_deref() {
            layout = layout.with_font_family(family);
        }
        info!(
            "laying out {} columns in {} groups on {}x{} pages",
            layout.columns.len(),
            layout.groups.len(),
            page_size.width,
            page_size.height
        );

        let mut observers: Vec<Box<dyn RowObserver + Send>> = Vec::new();
        if let Some(shared) = &self.observer {
            observers.push(Box::new(SharedObserver(Arc::clone(shared))));
        }
        if let Some(debug) = &self.debug {
            observers.push(Box::new(debug.clone()));
        }
        let mut paginator = TablePaginator::new(Canvas::new(page_size), layout, geometry)
            .with_keep_last_n(self.keep_last_n);
        if !observers.is_empty() {
            paginator = paginator.with_observer(Box::new(Fanout(observers)));
        }
        Ok(paginator)
    }

    fn write_document<W: Write>(
        &self,
        document: &Document,
        mut metrics: PaginationMetrics,
        writer: &mut W,
        context: &str,
    ) -> Result<PaginationMetrics, WideTableError> {
        metrics.total_bytes = pdf::write_pdf(document, writer)?;
        if let Some(debug) = &self.debug {
            debug.emit_summary(context, &metrics);
        }
        Ok(metrics)
    }
}

impl WideTableBuilder {
    pub fn new() -> Self {
        Self {
            page_size: None,
            margins: None,
            font_family: None,
            keep_last_n: DEFAULT_KEEP_LAST_N,
            observer: None,
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = Some(margins);
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Some(Margins::all(value));
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Page sets retained before a new one is opened.
    pub fn keep_last_n(mut self, keep_last_n: usize) -> Self {
        self.keep_last_n = keep_last_n;
        self
    }

    pub fn observer(mut self, observer: impl RowObserver + Send + 'static) -> Self {
        self.observer = Some(Arc::new(Mutex::new(observer)));
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<WideTable, WideTableError> {
        if self
            .font_family
            .as_deref()
            .is_some_and(|family| family.trim().is_empty())
        {
            return Err(WideTableError::InvalidConfiguration(
                "font family cannot be empty".to_string(),
            ));
        }
        if let Some(size) = self.page_size {
            if size.width <= Pt::ZERO || size.height <= Pt::ZERO {
                return Err(WideTableError::InvalidConfiguration(format!(
                    "page size must be positive, got {}x{}",
                    size.width, size.height
                )));
            }
        }
        let debug = match self.debug_path {
            Some(path) => Some(JsonlObserver::new(path)?),
            None => None,
        };
        Ok(WideTable {
            page_size: self.page_size,
            margins: self.margins,
            font_family: self.font_family,
            keep_last_n: self.keep_last_n,
            observer: self.observer,
            debug,
        })
    }
}

impl Default for WideTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
