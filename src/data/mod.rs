/// Data layer: grid cells, loading, and series extraction.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → Selection (rectangular grid of Cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  parse    │  roles, header, schema → ColumnBindings
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ extract   │  numeric rows only → Dataset series
///   └──────────┘
/// ```

pub mod extract;
pub mod loader;
pub mod model;
