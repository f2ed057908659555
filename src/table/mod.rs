//! Typed, columnar data interchange between nodes.
//!
//! A [`DataTable`] is the unit of data flowing along an edge: an ordered set
//! of [`DataRow`]s conforming to a [`DataTableSpec`]. Tables are built through
//! an append-only [`DataTableBuilder`] and frozen on `close()`; once closed a
//! table is immutable and can be shared read-only by any number of downstream
//! nodes via `Arc` without copying.

mod builder;
mod cell;
mod row;
mod spec;

pub use builder::{DataTable, DataTableBuilder};
pub use cell::{Cell, CellType};
pub use row::DataRow;
pub use spec::{ColumnSpec, DataTableSpec};
