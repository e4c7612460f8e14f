use crate::style::{CellStyle, HAlign};
use crate::types::Pt;

/// Column width used when the header supplies neither `width` nor
/// `styles.cellWidth`.
pub const DEFAULT_COLUMN_WIDTH: f32 = 120.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub index: usize,
    pub width: Pt,
    pub horizontal_align: HAlign,
    pub style: CellStyle,
}

/// A run of columns printed together on one physical page. Index 0, the
/// label column, leads every group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub columns: Vec<usize>,
    pub total_width: Pt,
}

impl ColumnGroup {
    fn seeded(columns: Vec<usize>, widths: &[Pt]) -> Self {
        let total_width = columns.iter().map(|i| widths[*i]).sum();
        Self {
            columns,
            total_width,
        }
    }

    fn push(&mut self, column: usize, width: Pt) {
        self.columns.push(column);
        self.total_width += width;
    }

    pub fn contains(&self, column: usize) -> bool {
        self.columns.contains(&column)
    }

    pub fn fits(&self, printable_width: Pt) -> bool {
        self.total_width <= printable_width
    }
}

/// Partitions columns into groups that each fit `printable_width`.
///
/// When everything fits (or there is at most one column) a single group
/// holds every column. Otherwise columns are packed greedily left to
/// right, opening a new group seeded with the label column whenever the
/// next column would overflow. A lone column wider than the page still
/// gets its own group and overflows; that is accepted, not an error.
///
/// The result depends only on the inputs.
pub fn compute_groups(widths: &[Pt], printable_width: Pt) -> Vec<ColumnGroup> {
    let total: Pt = widths.iter().sum();
    if widths.len() <= 1 || total <= printable_width {
        return vec![ColumnGroup::seeded((0..widths.len()).collect(), widths)];
    }

    let label_width = widths[0];
    let mut groups = Vec::new();
    let mut current = ColumnGroup::seeded(vec![0], widths);
    for (index, width) in widths.iter().copied().enumerate().skip(1) {
        if current.total_width + width <= printable_width {
            current.push(index, width);
        } else {
            groups.push(current);
            current = ColumnGroup {
                columns: vec![0, index],
                total_width: label_width + width,
            };
        }
    }
    groups.push(current);
    groups
}

pub fn column_widths(columns: &[ColumnSpec]) -> Vec<Pt> {
    columns.iter().map(|c| c.width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(values: &[f32]) -> Vec<Pt> {
        values.iter().map(|v| Pt::from_f32(*v)).collect()
    }

    fn assert_label_everywhere(groups: &[ColumnGroup]) {
        for group in groups {
            assert_eq!(group.columns.first(), Some(&0), "group {:?}", group);
        }
    }

    fn assert_every_column_assigned(groups: &[ColumnGroup], count: usize) {
        for column in 0..count {
            assert!(
                groups.iter().any(|g| g.contains(column)),
                "column {column} missing"
            );
        }
    }

    #[test]
    fn fitting_table_is_one_group_in_order() {
        let widths = pts(&[100.0, 100.0, 100.0]);
        let groups = compute_groups(&widths, Pt::from_f32(500.0));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].columns, vec![0, 1, 2]);
        assert_eq!(groups[0].total_width, Pt::from_f32(300.0));
    }

    #[test]
    fn exact_fit_is_one_group() {
        let widths = pts(&[250.0, 250.0]);
        let groups = compute_groups(&widths, Pt::from_f32(500.0));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn single_and_empty_column_lists() {
        let groups = compute_groups(&pts(&[900.0]), Pt::from_f32(500.0));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].columns, vec![0]);

        let groups = compute_groups(&[], Pt::from_f32(500.0));
        assert_eq!(groups.len(), 1);
        assert!(groups[0].columns.is_empty());
        assert_eq!(groups[0].total_width, Pt::ZERO);
    }

    #[test]
    fn wide_columns_each_get_a_page_with_the_label() {
        let widths = pts(&[80.0, 400.0, 400.0, 400.0]);
        let groups = compute_groups(&widths, Pt::from_f32(500.0));
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].columns, vec![0, 1]);
        assert_eq!(groups[1].columns, vec![0, 2]);
        assert_eq!(groups[2].columns, vec![0, 3]);
        for group in &groups {
            assert_eq!(group.total_width, Pt::from_f32(480.0));
        }
    }

    #[test]
    fn greedy_packing_respects_budget() {
        let widths = pts(&[50.0, 120.0, 200.0, 90.0, 300.0, 60.0, 60.0, 250.0]);
        let printable = Pt::from_f32(400.0);
        let groups = compute_groups(&widths, printable);
        assert_label_everywhere(&groups);
        assert_every_column_assigned(&groups, widths.len());
        assert_eq!(groups[0].columns, vec![0, 1, 2]);
        assert_eq!(groups[1].columns, vec![0, 3]);
        assert_eq!(groups[2].columns, vec![0, 4]);
        assert_eq!(groups[3].columns, vec![0, 5, 6]);
        assert_eq!(groups[4].columns, vec![0, 7]);
        for group in &groups {
            assert!(group.fits(printable));
            let sum: Pt = group.columns.iter().map(|c| widths[*c]).sum();
            assert_eq!(group.total_width, sum);
        }
    }

    #[test]
    fn over_wide_column_overflows_alone() {
        let widths = pts(&[100.0, 150.0, 700.0, 150.0]);
        let printable = Pt::from_f32(500.0);
        let groups = compute_groups(&widths, printable);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].columns, vec![0, 2]);
        assert_eq!(groups[1].total_width, Pt::from_f32(800.0));
        let over: Vec<_> = groups.iter().filter(|g| !g.fits(printable)).collect();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].columns.len(), 2);
        assert_label_everywhere(&groups);
    }

    #[test]
    fn grouping_is_deterministic() {
        let widths = pts(&[70.0, 210.0, 180.0, 330.0, 95.0, 95.0]);
        let printable = Pt::from_f32(420.0);
        assert_eq!(
            compute_groups(&widths, printable),
            compute_groups(&widths, printable)
        );
    }
}
