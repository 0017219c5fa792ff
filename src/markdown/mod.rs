//! Markdown text preparation
//!
//! Line-ending normalization, front matter splitting and the pipe-table
//! predicates shared by the formula extractor and the spreadsheet renderer.

pub mod frontmatter;
pub mod table;

pub use frontmatter::{normalize_line_endings, split_front_matter, FrontMatter};
pub use table::{
    is_separator_line, is_table_line, join_cells, parse_tables, split_cells, MarkdownTable,
};
