pub mod coefficients;
pub mod point;

mod axes_draw;
