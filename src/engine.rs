use crate::canvas::Surface;
use crate::cell::{CellBox, CellContext, draw_cell};
use crate::column::{ColumnGroup, ColumnSpec, column_widths, compute_groups};
use crate::error::{SourceError, WideTableError};
use crate::font::DEFAULT_FONT_FAMILY;
use crate::metrics::PaginationMetrics;
use crate::observer::{PageSetCreated, RowDrawn, RowObserver};
use crate::page_set::{PageSetId, PageSetManager};
use crate::row::Row;
use crate::types::{Color, Margins, Pt, Size};
use log::{debug, info, trace, warn};
use std::time::Instant;

/// Page sets kept besides the one about to be opened.
pub const DEFAULT_KEEP_LAST_N: usize = 1;

/// Printable area of a page, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub left: Pt,
    pub top: Pt,
    pub max_y: Pt,
    pub printable_width: Pt,
}

impl PageGeometry {
    pub fn from_page(size: Size, margins: &Margins) -> Self {
        Self {
            left: margins.left,
            top: margins.top,
            max_y: size.height - margins.bottom,
            printable_width: size.width - margins.left - margins.right,
        }
    }

    pub fn printable_height(&self) -> Pt {
        self.max_y - self.top
    }
}

/// Static description of the table: columns, their grouping and the
/// header row repeated at the top of every page.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub columns: Vec<ColumnSpec>,
    pub groups: Vec<ColumnGroup>,
    pub header: Row,
    pub header_background: Option<Color>,
    pub body_background: Option<Color>,
    pub font_family: String,
}

impl TableLayout {
    /// Groups the columns once for `printable_width`.
    pub fn new(columns: Vec<ColumnSpec>, header: Row, printable_width: Pt) -> Self {
        let groups = compute_groups(&column_widths(&columns), printable_width);
        Self {
            columns,
            groups,
            header,
            header_background: None,
            body_background: None,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    pub fn with_backgrounds(mut self, header: Option<Color>, body: Option<Color>) -> Self {
        self.header_background = header;
        self.body_background = body;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NoActiveSet,
    Active,
    /// Entered after a fatal error; no further rows are accepted.
    Done,
}

/// Streams rows onto a surface, one page per column group, opening a new
/// page set whenever a row does not fit on every page of the current one.
pub struct TablePaginator<S: Surface> {
    surface: S,
    layout: TableLayout,
    geometry: PageGeometry,
    manager: PageSetManager,
    keep_last_n: usize,
    state: EngineState,
    observer: Option<Box<dyn RowObserver + Send>>,
    metrics: PaginationMetrics,
    rows_seen: usize,
    started_at: Instant,
}

impl<S: Surface> TablePaginator<S> {
    pub fn new(surface: S, layout: TableLayout, geometry: PageGeometry) -> Self {
        let over_wide_groups = layout
            .groups
            .iter()
            .filter(|group| !group.fits(geometry.printable_width))
            .count();
        if over_wide_groups > 0 {
            warn!(
                "{over_wide_groups} column group(s) exceed the printable width of {}",
                geometry.printable_width
            );
        }
        let metrics = PaginationMetrics {
            column_groups: layout.groups.len(),
            over_wide_groups,
            ..PaginationMetrics::default()
        };
        Self {
            surface,
            layout,
            geometry,
            manager: PageSetManager::new(),
            keep_last_n: DEFAULT_KEEP_LAST_N,
            state: EngineState::NoActiveSet,
            observer: None,
            metrics,
            rows_seen: 0,
            started_at: Instant::now(),
        }
    }

    pub fn with_keep_last_n(mut self, keep_last_n: usize) -> Self {
        self.keep_last_n = keep_last_n;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RowObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn metrics(&self) -> &PaginationMetrics {
        &self.metrics
    }

    pub fn manager(&self) -> &PageSetManager {
        &self.manager
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Opens the first page set so headers exist before any row arrives.
    /// Calling it again is a no-op.
    pub fn start(&mut self) -> Result<(), WideTableError> {
        match self.state {
            EngineState::Done => Err(WideTableError::AlreadyFinished),
            EngineState::Active => Ok(()),
            EngineState::NoActiveSet => {
                let result = self.open_page_set(None);
                self.settle(result)?;
                self.state = EngineState::Active;
                Ok(())
            }
        }
    }

    pub fn push_row(&mut self, row: &Row) -> Result<(), WideTableError> {
        self.start()?;
        let result = self.place_row(row);
        self.settle(result)
    }

    /// Draws the stream to completion and finalizes the surface.
    pub fn run<I, E>(mut self, rows: I) -> Result<(S::Output, PaginationMetrics), WideTableError>
    where
        I: IntoIterator<Item = Result<Row, E>>,
        E: Into<SourceError>,
    {
        self.start()?;
        for (index, item) in rows.into_iter().enumerate() {
            let row = item.map_err(|err| WideTableError::row_source(index, err))?;
            self.push_row(&row)?;
        }
        self.finish()
    }

    /// Like `run`, but the rows arrive over a channel. The stream ends when
    /// every sender has been dropped.
    pub async fn run_channel<E>(
        mut self,
        rows: async_channel::Receiver<Result<Row, E>>,
    ) -> Result<(S::Output, PaginationMetrics), WideTableError>
    where
        E: Into<SourceError>,
    {
        self.start()?;
        let mut index = 0usize;
        while let Ok(item) = rows.recv().await {
            let row = item.map_err(|err| WideTableError::row_source(index, err))?;
            self.push_row(&row)?;
            index += 1;
        }
        self.finish()
    }

    /// Finalizes the surface and drops all page-set tracking.
    pub fn finish(mut self) -> Result<(S::Output, PaginationMetrics), WideTableError> {
        self.start()?;
        self.manager.clear();
        self.metrics.pages = self.surface.page_count();
        self.metrics.total_render_ms = self.started_at.elapsed().as_secs_f64() * 1000.0;
        info!(
            "paginated {} rows onto {} pages in {} page sets",
            self.metrics.rows_drawn, self.metrics.pages, self.metrics.page_sets_created
        );
        let output = self.surface.finalize()?;
        Ok((output, self.metrics))
    }

    fn settle<T>(&mut self, result: Result<T, WideTableError>) -> Result<T, WideTableError> {
        if result.is_err() {
            self.state = EngineState::Done;
        }
        result
    }

    fn place_row(&mut self, row: &Row) -> Result<(), WideTableError> {
        let row_index = self.rows_seen;
        self.rows_seen += 1;
        if !self.manager.can_fit_row(row.height, self.geometry.max_y) {
            trace!("row {row_index} of height {} overflows the page set", row.height);
            self.open_page_set(Some(row_index))?;
            if !self.manager.can_fit_row(row.height, self.geometry.max_y) {
                warn!(
                    "row {row_index} of height {} is taller than the printable area",
                    row.height
                );
                self.metrics.oversized_rows += 1;
            }
        }

        let page_set = self
            .manager
            .active_id()
            .ok_or(WideTableError::NoActivePageSet)?;
        let mut pages = Vec::with_capacity(self.layout.groups.len());
        for (group_index, group) in self.layout.groups.iter().enumerate() {
            let state = *self
                .manager
                .page_state(group_index)
                .ok_or(WideTableError::MissingPageState {
                    group: group_index,
                    page_set,
                })?;
            self.surface.switch_to_page(state.page_index)?;
            let (bottom, cells) = draw_row_cells(
                &mut self.surface,
                &self.layout,
                self.geometry.left,
                state.cursor_y,
                group,
                row,
                self.layout.body_background,
            )?;
            self.manager.update_page_state(group_index, bottom)?;
            self.metrics.cells_drawn += cells;
            pages.push(state.page_index);
        }
        self.metrics.rows_drawn += 1;

        if let Some(observer) = self.observer.as_mut() {
            observer.on_row_drawn(&RowDrawn {
                row_index,
                page_set,
                height: row.height.to_f32(),
                pages,
            });
        }
        Ok(())
    }

    fn open_page_set(
        &mut self,
        trigger_row: Option<usize>,
    ) -> Result<PageSetId, WideTableError> {
        let released = if trigger_row.is_some() {
            self.manager.cleanup(self.keep_last_n)
        } else {
            0
        };
        self.metrics.page_sets_released += released;

        let layout = &self.layout;
        let left = self.geometry.left;
        let id = self.manager.create_page_set(
            &layout.groups,
            &mut self.surface,
            self.geometry.top,
            |surface, _, group, top| {
                let (bottom, _) = draw_row_cells(
                    surface,
                    layout,
                    left,
                    top,
                    group,
                    &layout.header,
                    layout.header_background,
                )?;
                Ok(bottom)
            },
        )?;
        self.metrics.page_sets_created += 1;

        let first_page = self
            .manager
            .active()
            .and_then(|set| set.states().first())
            .map(|state| state.page_index)
            .unwrap_or_default();
        debug!(
            "page set {id} opened at page {first_page} (trigger row {trigger_row:?}, released {released})"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_page_set_created(&PageSetCreated {
                page_set: id,
                first_page,
                page_count: self.layout.groups.len(),
                trigger_row,
                released,
            });
        }
        Ok(id)
    }
}

/// Draws the cells of `row` that belong to `group`, left to right from
/// `left`. Returns the row bottom and the number of cells drawn. Cells the
/// row does not supply leave their column blank.
fn draw_row_cells<S: Surface>(
    surface: &mut S,
    layout: &TableLayout,
    left: Pt,
    y: Pt,
    group: &ColumnGroup,
    row: &Row,
    background: Option<Color>,
) -> Result<(Pt, usize), WideTableError> {
    let mut x = left;
    let mut drawn = 0;
    for &column_index in &group.columns {
        let Some(column) = layout.columns.get(column_index) else {
            continue;
        };
        if let Some(cell) = row.cell(column_index) {
            let context = CellContext {
                column_align: Some(column.horizontal_align),
                background,
                font_family: &layout.font_family,
            };
            let frame = CellBox {
                x,
                y,
                width: column.width,
                height: row.height,
            };
            draw_cell(surface, frame, &cell.content, &cell.style, &context)?;
            drawn += 1;
        }
        x += column.width;
    }
    Ok((y + row.height, drawn))
}
