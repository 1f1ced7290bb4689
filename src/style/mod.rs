//! Style module - presentation context, tick formatters and color palettes

mod context;
mod format;
pub mod palette;

pub use context::{
    context, try_with_context, with_context, ColorSpec, ContextError, ContextProfile,
    ContextScope, PlottingContext, RenderOptions, Style, StyleOverrides,
};
pub use format::{date_to_x, percentage, two_dec_places, x_to_date, TickFormat};
