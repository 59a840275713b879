// Rendering configuration: sizes and arrangement of chart collections

/// How a collection of charts is drawn. Each chart gets a `width` x
/// `height` cell; cells are laid out `columns` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub columns: usize,
    pub line_width: u32,
}

impl RenderConfig {
    /// Side-by-side comparison view: charts stacked in one column.
    pub fn comparison() -> Self {
        RenderConfig {
            width: 800,
            height: 250,
            columns: 1,
            line_width: 2,
        }
    }

    /// Saved-plots view: smaller charts, three per row.
    pub fn saved_grid() -> Self {
        RenderConfig {
            width: 500,
            height: 200,
            columns: 3,
            line_width: 2,
        }
    }

    /// Total canvas size for `n_charts` charts, or `None` if it does not
    /// fit in `u32` pixels.
    pub fn canvas_size(&self, n_charts: usize) -> Option<(u32, u32)> {
        let layout = crate::compiler::compile_layout(n_charts, self.columns);
        let ncol = u32::try_from(layout.ncol.max(1)).ok()?;
        let nrow = u32::try_from(layout.nrow.max(1)).ok()?;
        Some((self.width.checked_mul(ncol)?, self.height.checked_mul(nrow)?))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig::comparison()
    }
}
