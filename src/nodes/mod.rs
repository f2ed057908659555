//! Built-in node types.
//!
//! Each node is an independent value type implementing
//! [`NodeModel`](crate::node::NodeModel) with a typed serde config struct
//! behind its settings. The engine treats all of them as opaque computations
//! behind the fixed contract; nothing here is special-cased by the scheduler.

mod chart_sink;
mod column_select;
mod csv_source;
mod group_aggregate;
mod row_filter;

pub use chart_sink::{ChartSinkFactory, ChartSinkModel};
pub use column_select::{ColumnSelectFactory, ColumnSelectModel};
pub use csv_source::{CsvSourceFactory, CsvSourceModel};
pub use group_aggregate::{AggregateFunction, GroupAggregateFactory, GroupAggregateModel};
pub use row_filter::{FilterOperator, RowFilterFactory, RowFilterModel};
