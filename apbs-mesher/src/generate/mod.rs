mod box_3d;

pub use box_3d::*;
