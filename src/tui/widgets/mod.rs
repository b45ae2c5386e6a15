pub mod color;
pub mod confirm_delete;
pub mod editor;
pub mod form;
pub mod help;
pub mod item_view;
pub mod popup;
pub mod status_bar;
pub mod task_list;
