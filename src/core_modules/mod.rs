pub mod mask;
pub mod pixel;
pub mod reorder;
pub mod segmenter;
pub mod sorter;
pub mod traversal;
