pub mod geometry;
pub mod hit;
pub mod svg;

pub use geometry::{world_bounds, world_center};
pub use hit::{hit_test, hit_test_rect};
pub use svg::{SvgOptions, render_svg};
