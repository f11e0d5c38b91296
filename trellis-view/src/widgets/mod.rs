//! Built-in widgets, registered under the `t/` namespace.

mod async_builder;
mod container;
mod flex;
mod media;
mod text;

pub use async_builder::{AsyncBuilderProps, AsyncBuilderWidget};
pub use container::{ContainerProps, ContainerWidget, SpacerProps, SpacerWidget};
pub use flex::{Axis, CarouselProps, CarouselWidget, FlexProps, FlexWidget, StackWidget};
pub use media::{IconProps, IconWidget, ImageProps, ImageWidget};
pub use text::{TextProps, TextWidget};

use crate::WidgetRegistry;

/// Register every built-in builder. Hosts may override any key afterwards.
pub fn register_builtins(registry: &mut WidgetRegistry) {
    text::register(registry);
    media::register(registry);
    container::register(registry);
    flex::register(registry);
    async_builder::register(registry);
}
