pub mod axes;
pub mod legend;
pub mod multi_panel;
