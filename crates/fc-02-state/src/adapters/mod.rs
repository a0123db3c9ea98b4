pub mod mem_view;

pub use mem_view::MemView;
