pub(crate) mod distort;
pub(crate) mod homography;
pub(crate) mod rotate;
pub(crate) mod skew;
pub(crate) mod warp;
