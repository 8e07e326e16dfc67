//! Table column reconciliation.
//!
//! Every row brings its own `\cellx` boundaries. Merging the boundaries of
//! all rows gives the table's columns; each cell then spans the columns
//! between its left and right boundary. A row whose boundaries cannot be
//! expressed that way starts a new table.

use super::format::{MergeKind, RowFormat};
use super::node::{ColumnState, DocumentNode, NodeId, NodeType};
use super::node_array::DocumentNodeArray;
use tracing::{debug, trace};

/// Width used for cells that have no `\cellx` of their own, twips.
const DEFAULT_CELL_WIDTH: i64 = 1440;

impl DocumentNodeArray {
    /// Reconcile every unprocessed table in the subtree at `at`.
    pub(crate) fn process_tables(&mut self, at: usize) {
        let end = self.span_end(at);
        let tables: Vec<NodeId> = (at..end)
            .filter(|&p| {
                let node = self.at(p);
                node.node_type == NodeType::Table && !node.pending && !node.terminated && node.column_states.is_empty()
            })
            .map(|p| self.id_at(p))
            .collect();
        for table in tables {
            self.reconcile_table(table);
        }
    }

    fn reconcile_table(&mut self, table: NodeId) {
        let mut current = table;
        loop {
            let columns = self.compute_columns(current);
            match self.min_unfilled_row(current, &columns) {
                Some(row) => {
                    trace!(row = self.index_of(row), "splitting table at inconsistent row");
                    let rest = self.split_table(current, row);
                    let columns = self.compute_columns(current);
                    self.assign_columns(current, columns);
                    current = rest;
                },
                None => {
                    self.assign_columns(current, columns);
                    return;
                },
            }
        }
    }

    /// Row nodes of the table, in order.
    pub(crate) fn table_rows(&self, table: NodeId) -> Vec<NodeId> {
        let at = self.index_of(table);
        let end = self.span_end(at);
        let mut rows = Vec::new();
        let mut position = at + 1;
        while position < end {
            let node = self.at(position);
            match node.node_type {
                NodeType::TableBody => position += 1,
                NodeType::Row => {
                    rows.push(self.id_at(position));
                    position = self.span_end(position);
                },
                _ => position = self.span_end(position),
            }
        }
        rows
    }

    fn row_format_of(&self, row: NodeId) -> RowFormat {
        self.get(row).row_format.as_deref().cloned().unwrap_or_default()
    }

    /// Merge the boundaries of every row into one sorted column list.
    pub(crate) fn compute_columns(&self, table: NodeId) -> Vec<ColumnState> {
        let mut columns: Vec<ColumnState> = Vec::new();
        for row in self.table_rows(table) {
            let format = self.row_format_of(row);
            let mut previous_x = i64::MIN;
            for cellx in format.boundaries() {
                // Zero-width cells carry no boundary of their own
                if cellx == previous_x {
                    continue;
                }
                let slot = columns.partition_point(|c| c.cellx < cellx);
                if columns.get(slot).is_none_or(|c| c.cellx != cellx) {
                    let previous_column = if slot == 0 { i64::MIN } else { columns[slot - 1].cellx };
                    columns.insert(
                        slot,
                        ColumnState {
                            cellx,
                            row,
                            filled: previous_column == previous_x,
                        },
                    );
                }
                previous_x = cellx;
            }
        }
        columns
    }

    /// Earliest row, other than the first, that introduced a column it does
    /// not fill.
    pub(crate) fn min_unfilled_row(&self, table: NodeId, columns: &[ColumnState]) -> Option<NodeId> {
        let first = self.table_rows(table).first().copied();
        columns
            .iter()
            .filter(|c| !c.filled && Some(c.row) != first)
            .map(|c| c.row)
            .min_by_key(|&row| self.index_of(row))
    }

    /// Move `row` and every later row of its body into a new table placed
    /// right after `table`. Returns the new table.
    pub(crate) fn split_table(&mut self, table: NodeId, row: NodeId) -> NodeId {
        let t = self.index_of(table);
        let p = self.index_of(row);
        let body_position = self.parent_of(p).unwrap_or(t + 1);
        let body_end = self.span_end(body_position);
        let moved = body_end - p;

        self.get_mut(table).child_count -= moved;
        self.at_mut(body_position).child_count = p - body_position - 1;

        let format = self.get(table).format.clone();
        let mut new_table = DocumentNode::new(NodeType::Table, format.clone());
        new_table.pending = false;
        new_table.child_count = moved + 1;
        new_table.parent = self.get(table).parent;
        new_table.row_format = self.get(row).row_format.clone();
        let mut new_body = DocumentNode::new(NodeType::TableBody, format);
        new_body.pending = false;
        new_body.child_count = moved;

        let mut ancestor = self.get(table).parent;
        while let Some(pid) = ancestor {
            let node = self.get_mut(pid);
            if node.pending {
                break;
            }
            node.child_count += 2;
            ancestor = node.parent;
        }

        let new_table_id = self.insert(p, new_table);
        let new_body_id = self.insert(p + 1, new_body);
        self.get_mut(new_body_id).parent = Some(new_table_id);
        let end = p + 2 + moved;
        let mut child = p + 2;
        while child < end {
            let node = self.at_mut(child);
            node.parent = Some(new_body_id);
            child += node.child_count + 1;
        }
        new_table_id
    }

    /// Store the columns on the table and derive every cell's span and
    /// formatting.
    pub(crate) fn assign_columns(&mut self, table: NodeId, columns: Vec<ColumnState>) {
        let rows = self.table_rows(table);
        let left = rows
            .iter()
            .filter_map(|&r| self.get(r).row_format.as_ref().map(|f| f.left))
            .min()
            .unwrap_or(0);
        if let Some(&first) = rows.first() {
            let format = self.get(first).row_format.clone();
            self.get_mut(table).row_format = format;
        }

        // (cell, first column, vertical merge) per row
        let mut grid: Vec<Vec<(NodeId, usize, MergeKind)>> = Vec::with_capacity(rows.len());
        for &row in &rows {
            let format = self.row_format_of(row);
            let row_position = self.index_of(row);
            let cells: Vec<NodeId> = self
                .children(row_position)
                .into_iter()
                .filter(|&p| self.at(p).node_type == NodeType::Cell)
                .map(|p| self.id_at(p))
                .collect();
            if cells.len() > format.cells.len() {
                debug!(cells = cells.len(), defined = format.cells.len(), "row has more cells than definitions");
            }

            let mut placed = Vec::with_capacity(cells.len());
            let mut previous_x = i64::MIN;
            let mut last_known = left;
            let mut k = 0;
            while k < cells.len() {
                let mut cell_format = format.nth_cell(k);
                cell_format.inherit_padding(&format.row_cell);
                if format.gap > 0 {
                    if cell_format.padding_left < 0 {
                        cell_format.padding_left = format.gap;
                    }
                    if cell_format.padding_right < 0 {
                        cell_format.padding_right = format.gap;
                    }
                }
                if !cell_format.has_borders() {
                    cell_format.top = format.row_cell.top;
                    cell_format.left = format.row_cell.left;
                    cell_format.bottom = format.row_cell.bottom;
                    cell_format.right = format.row_cell.right;
                }

                let mut right = if k < format.cells.len() {
                    format.cells[k].cellx + format.left
                } else {
                    last_known + DEFAULT_CELL_WIDTH
                };
                // A merged range ends at its last continuation cell
                let mut last = k;
                if cell_format.h_merge == MergeKind::First {
                    while last + 1 < cells.len()
                        && last + 1 < format.cells.len()
                        && format.cells[last + 1].h_merge == MergeKind::Continue
                    {
                        last += 1;
                        right = format.cells[last].cellx + format.left;
                    }
                }

                let first_column = columns.iter().filter(|c| c.cellx <= previous_x).count();
                let span = columns
                    .iter()
                    .filter(|c| c.cellx > previous_x && c.cellx <= right)
                    .count()
                    .max(1);

                let node = self.get_mut(cells[k]);
                node.col_span = span;
                node.cell_format = Some(cell_format);
                placed.push((cells[k], first_column, cell_format.v_merge));

                for &merged in &cells[k + 1..=last] {
                    self.get_mut(merged).col_span = 0;
                }

                previous_x = right;
                last_known = right;
                k = last + 1;
            }
            grid.push(placed);
        }

        for r in 0..grid.len() {
            for &(cell, column, merge) in &grid[r] {
                if merge != MergeKind::First {
                    continue;
                }
                let mut span = 1;
                for below in &grid[r + 1..] {
                    let Some(&(continued, _, _)) = below
                        .iter()
                        .find(|&&(_, c, m)| c == column && m == MergeKind::Continue)
                    else {
                        break;
                    };
                    self.get_mut(continued).row_span = 0;
                    span += 1;
                }
                self.get_mut(cell).row_span = span;
            }
        }

        let node = self.get_mut(table);
        node.table_left = left;
        node.column_states = columns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xaml::format::FormatState;

    fn row_format(boundaries: &[i64]) -> RowFormat {
        let mut format = RowFormat::default();
        for &x in boundaries {
            format.push_cell(x);
        }
        format
    }

    /// A closed table whose rows have the given boundaries, one text cell
    /// per boundary.
    fn build_table(rows: &[&[i64]]) -> DocumentNodeArray {
        let mut array = DocumentNodeArray::new();
        let format = FormatState::default();
        array.push(DocumentNode::new(NodeType::Table, format.clone()));
        array.push(DocumentNode::new(NodeType::TableBody, format.clone()));
        for boundaries in rows {
            let row = array.push(DocumentNode::new(NodeType::Row, format.clone()));
            for _ in 0..boundaries.len() {
                let cell = array.push(DocumentNode::new(NodeType::Cell, format.clone()));
                array.push(DocumentNode::text(format.clone(), "x"));
                let at = array.index_of(cell);
                array.close_at(at);
            }
            array.get_mut(row).row_format = Some(Box::new(row_format(boundaries)));
            let at = array.index_of(row);
            array.close_at(at);
        }
        array.close_at(0);
        array
    }

    fn tables(array: &DocumentNodeArray) -> Vec<NodeId> {
        (0..array.len())
            .filter(|&p| array.at(p).node_type == NodeType::Table)
            .map(|p| array.id_at(p))
            .collect()
    }

    #[test]
    fn test_consistent_rows_share_columns() {
        let mut array = build_table(&[&[2000, 4000], &[4000]]);
        array.process_tables(0);
        let found = tables(&array);
        assert_eq!(found.len(), 1);
        let table = array.get(found[0]);
        assert_eq!(table.column_states.iter().map(|c| c.cellx).collect::<Vec<_>>(), vec![2000, 4000]);

        let rows = array.table_rows(found[0]);
        let second = array.children(array.index_of(rows[1]));
        assert_eq!(array.at(second[0]).col_span, 2);
    }

    #[test]
    fn test_mismatched_rows_split_table() {
        let mut array = build_table(&[&[2000, 4000], &[3000, 5000]]);
        array.process_tables(0);
        let found = tables(&array);
        assert_eq!(found.len(), 2);
        assert_eq!(array.table_rows(found[0]).len(), 1);
        assert_eq!(array.table_rows(found[1]).len(), 1);
        // The first table now ends where the second starts
        assert_eq!(array.span_end(0), array.index_of(found[1]));
        assert_eq!(array.span_end(array.index_of(found[1])), array.len());

        // A second pass finds nothing left to split
        for table in found {
            array.get_mut(table).column_states.clear();
        }
        array.process_tables(0);
        let second = array.index_of(tables(&array)[1]);
        array.process_tables(second);
        assert_eq!(tables(&array).len(), 2);
    }

    #[test]
    fn test_vertical_merge_sets_row_span() {
        let mut array = build_table(&[&[2000, 4000], &[2000, 4000]]);
        let rows = array.table_rows(array.id_at(0));
        for (row, merge) in rows.iter().zip([MergeKind::First, MergeKind::Continue]) {
            if let Some(format) = array.get_mut(*row).row_format.as_mut() {
                format.cells[0].v_merge = merge;
            }
        }
        array.process_tables(0);
        let first_row = array.children(array.index_of(rows[0]));
        let second_row = array.children(array.index_of(rows[1]));
        assert_eq!(array.at(first_row[0]).row_span, 2);
        assert_eq!(array.at(second_row[0]).row_span, 0);
        assert!(array.at(second_row[0]).is_dropped());
        assert_eq!(array.at(second_row[1]).row_span, 1);
    }
}
