use crate::foundation::core::Margin;

/// Top-left corner that puts a `mark_width x mark_height` logo's bottom-right corner exactly
/// `margin` away from the canvas's bottom-right corner.
pub fn watermark_origin(
    canvas_width: u32,
    canvas_height: u32,
    mark_width: u32,
    mark_height: u32,
    margin: Margin,
) -> (i64, i64) {
    (
        i64::from(canvas_width) - i64::from(mark_width) - i64::from(margin.right),
        i64::from(canvas_height) - i64::from(mark_height) - i64::from(margin.bottom),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/compose/watermark.rs"]
mod tests;
