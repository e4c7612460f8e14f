use crate::canvas::Surface;
use crate::column::ColumnGroup;
use crate::error::WideTableError;
use crate::types::Pt;
use log::{debug, trace};
use std::collections::VecDeque;

pub type PageSetId = u64;

pub const META_PAGE_SET_KEY: &str = "widetable.page_set";
pub const META_COLUMN_GROUP_KEY: &str = "widetable.column_group";

/// Write position of one column group's page within a page set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageState {
    pub page_index: usize,
    pub cursor_y: Pt,
    pub column_group: usize,
}

/// One physical page per column group, all covering the same rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSet {
    id: PageSetId,
    states: Vec<PageState>,
}

impl PageSet {
    pub fn id(&self) -> PageSetId {
        self.id
    }

    pub fn state(&self, column_group: usize) -> Option<&PageState> {
        self.states.get(column_group)
    }

    pub fn states(&self) -> &[PageState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Tracks page sets in creation order. Only the newest set is written to;
/// older ones stay addressable until `cleanup` releases them.
#[derive(Debug, Default)]
pub struct PageSetManager {
    page_sets: VecDeque<PageSet>,
    next_id: PageSetId,
}

impl PageSetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a page per column group, draws its header and starts its
    /// cursor at the header bottom. The very first set reuses the
    /// surface's open page for group 0.
    pub fn create_page_set<S, F>(
        &mut self,
        groups: &[ColumnGroup],
        surface: &mut S,
        top_y: Pt,
        mut draw_header: F,
    ) -> Result<PageSetId, WideTableError>
    where
        S: Surface,
        F: FnMut(&mut S, usize, &ColumnGroup, Pt) -> Result<Pt, WideTableError>,
    {
        let id = self.next_id;
        let mut states = Vec::with_capacity(groups.len());
        for (group_index, group) in groups.iter().enumerate() {
            if !(id == 0 && group_index == 0) {
                surface.append_page();
            }
            let page_index = surface.page_count() - 1;
            surface.switch_to_page(page_index)?;
            surface.annotate(META_PAGE_SET_KEY, &id.to_string());
            surface.annotate(META_COLUMN_GROUP_KEY, &group_index.to_string());
            let cursor_y = draw_header(surface, group_index, group, top_y)?;
            trace!(
                "page set {id}: group {group_index} on page {page_index}, header ends at {cursor_y}"
            );
            states.push(PageState {
                page_index,
                cursor_y,
                column_group: group_index,
            });
        }
        self.next_id += 1;
        self.page_sets.push_back(PageSet { id, states });
        debug!(
            "created page set {id} with {} pages ({} retained)",
            groups.len(),
            self.page_sets.len()
        );
        Ok(id)
    }

    pub fn active(&self) -> Option<&PageSet> {
        self.page_sets.back()
    }

    pub fn active_id(&self) -> Option<PageSetId> {
        self.active().map(PageSet::id)
    }

    pub fn page_set(&self, id: PageSetId) -> Option<&PageSet> {
        self.page_sets.iter().find(|set| set.id == id)
    }

    pub fn page_state(&self, column_group: usize) -> Option<&PageState> {
        self.active().and_then(|set| set.state(column_group))
    }

    /// True only when the row fits under `max_y` on every page of the
    /// active set. Without an active set nothing fits.
    pub fn can_fit_row(&self, row_height: Pt, max_y: Pt) -> bool {
        match self.active() {
            Some(set) => set
                .states
                .iter()
                .all(|state| state.cursor_y + row_height <= max_y),
            None => false,
        }
    }

    pub fn update_page_state(
        &mut self,
        column_group: usize,
        new_y: Pt,
    ) -> Result<(), WideTableError> {
        let set = self
            .page_sets
            .back_mut()
            .ok_or(WideTableError::NoActivePageSet)?;
        let page_set = set.id;
        let state = set
            .states
            .get_mut(column_group)
            .ok_or(WideTableError::MissingPageState {
                group: column_group,
                page_set,
            })?;
        debug_assert!(new_y >= state.cursor_y, "cursor moved upwards");
        state.cursor_y = new_y;
        Ok(())
    }

    /// Keeps the `keep_last_n` newest sets and releases the rest.
    /// Returns how many sets were released.
    pub fn cleanup(&mut self, keep_last_n: usize) -> usize {
        let mut released = 0;
        while self.page_sets.len() > keep_last_n {
            self.page_sets.pop_front();
            released += 1;
        }
        if released > 0 {
            trace!("released {released} page sets, {} retained", self.page_sets.len());
        }
        released
    }

    /// Number of sets currently tracked, active one included.
    pub fn retained(&self) -> usize {
        self.page_sets.len()
    }

    /// Number of sets created since the last `clear`.
    pub fn created(&self) -> u64 {
        self.next_id
    }

    pub fn clear(&mut self) {
        self.page_sets.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::types::Size;

    fn groups(count: usize) -> Vec<ColumnGroup> {
        (0..count)
            .map(|i| ColumnGroup {
                columns: vec![0, i + 1],
                total_width: Pt::from_f32(200.0),
            })
            .collect()
    }

    fn header_height(
        height: f32,
    ) -> impl FnMut(&mut Canvas, usize, &ColumnGroup, Pt) -> Result<Pt, WideTableError> {
        move |_, _, _, top| Ok(top + Pt::from_f32(height))
    }

    fn pt(v: f32) -> Pt {
        Pt::from_f32(v)
    }

    #[test]
    fn first_set_reuses_open_page() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        let id = manager
            .create_page_set(&groups(3), &mut canvas, pt(10.0), header_height(20.0))
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(canvas.page_count(), 3);
        let set = manager.active().unwrap();
        let pages: Vec<usize> = set.states().iter().map(|s| s.page_index).collect();
        assert_eq!(pages, vec![0, 1, 2]);
        assert!(set.states().iter().all(|s| s.cursor_y == pt(30.0)));
        assert_eq!(canvas.pages()[1].meta(META_COLUMN_GROUP_KEY), Some("1"));

        manager
            .create_page_set(&groups(3), &mut canvas, pt(10.0), header_height(20.0))
            .unwrap();
        assert_eq!(canvas.page_count(), 6);
        let pages: Vec<usize> = manager
            .active()
            .unwrap()
            .states()
            .iter()
            .map(|s| s.page_index)
            .collect();
        assert_eq!(pages, vec![3, 4, 5]);
        assert_eq!(canvas.pages()[3].meta(META_PAGE_SET_KEY), Some("1"));
    }

    #[test]
    fn header_failure_propagates() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        let result = manager.create_page_set(&groups(2), &mut canvas, pt(0.0), |_, _, _, _| {
            Err(WideTableError::Pdf("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(manager.active().is_none());
    }

    #[test]
    fn fit_requires_every_group() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        assert!(!manager.can_fit_row(pt(1.0), pt(1000.0)));

        manager
            .create_page_set(&groups(2), &mut canvas, pt(0.0), header_height(20.0))
            .unwrap();
        assert!(manager.can_fit_row(pt(80.0), pt(100.0)));
        manager.update_page_state(1, pt(50.0)).unwrap();
        // group 0 would fit, group 1 would not
        assert!(!manager.can_fit_row(pt(60.0), pt(100.0)));
        assert!(manager.can_fit_row(pt(50.0), pt(100.0)));
    }

    #[test]
    fn update_reports_missing_group() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        assert!(matches!(
            manager.update_page_state(0, pt(1.0)),
            Err(WideTableError::NoActivePageSet)
        ));
        manager
            .create_page_set(&groups(2), &mut canvas, pt(0.0), header_height(20.0))
            .unwrap();
        let err = manager.update_page_state(5, pt(40.0)).unwrap_err();
        assert!(matches!(err, WideTableError::MissingPageState { group: 5, page_set: 0 }));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn cleanup_bounds_history() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        for _ in 0..5 {
            manager.cleanup(1);
            manager
                .create_page_set(&groups(2), &mut canvas, pt(0.0), header_height(20.0))
                .unwrap();
            assert!(manager.retained() <= 2);
        }
        // one previous set plus the active one
        assert_eq!(manager.retained(), 2);
        assert_eq!(manager.active_id(), Some(4));
        assert!(manager.page_set(3).is_some());
        assert!(manager.page_set(2).is_none());
        assert_eq!(manager.created(), 5);
        // the canvas keeps every page
        assert_eq!(canvas.page_count(), 10);

        assert_eq!(manager.cleanup(2), 0);
        assert_eq!(manager.cleanup(0), 2);
        assert!(manager.active().is_none());
    }

    #[test]
    fn clear_resets_sequence() {
        let mut canvas = Canvas::new(Size::a4());
        let mut manager = PageSetManager::new();
        manager
            .create_page_set(&groups(1), &mut canvas, pt(0.0), header_height(20.0))
            .unwrap();
        manager.clear();
        assert_eq!(manager.retained(), 0);
        assert_eq!(manager.created(), 0);
        assert!(manager.page_state(0).is_none());
    }
}
