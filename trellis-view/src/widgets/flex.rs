//! Multi-child widgets: row, column, stack, carousel.
//!
//! Row/column and carousel support data-driven repetition: when a
//! `dataSource` expression is present, the single declared child renders
//! once per item of the evaluated list, each pass wrapped in an item scope
//! exposing `currentItem` and `index`. Rendered order always equals the
//! evaluated list's order.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use trellis_api::ExprValue;
use trellis_runtime::{Controller, DefaultScopeContext, ScopeContext};

use crate::{
    BuiltChildren, FlexAttrs, RenderPayload, ViewError, ViewNode, VirtualWidget, WidgetBase,
    WidgetRegistry, render_widget,
};

/// Main-axis direction of a flex widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexProps {
    #[serde(default)]
    pub data_source: Option<ExprValue>,
    #[serde(default)]
    pub main_axis_alignment: Option<String>,
    #[serde(default)]
    pub cross_axis_alignment: Option<String>,
    #[serde(default)]
    pub spacing: Option<f64>,
}

/// Row or column.
pub struct FlexWidget {
    base: WidgetBase,
    axis: Axis,
    props: FlexProps,
    children: Vec<Arc<dyn VirtualWidget>>,
}

impl FlexWidget {
    pub fn new(
        base: WidgetBase,
        axis: Axis,
        props: FlexProps,
        children: Vec<Arc<dyn VirtualWidget>>,
    ) -> Self {
        Self { base, axis, props, children }
    }

    fn attrs(&self) -> FlexAttrs {
        FlexAttrs {
            main_axis_alignment: self.props.main_axis_alignment.clone(),
            cross_axis_alignment: self.props.cross_axis_alignment.clone(),
            spacing: self.props.spacing,
        }
    }
}

impl VirtualWidget for FlexWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let children = render_flex_children(
            &self.children,
            self.props.data_source.as_ref(),
            payload,
        )?;
        let attrs = self.attrs();
        Ok(match self.axis {
            Axis::Horizontal => ViewNode::Row { children, attrs },
            Axis::Vertical => ViewNode::Column { children, attrs },
        })
    }
}

/// Render static children as declared, or repeat the single declared child
/// per item of the evaluated data source.
pub(crate) fn render_flex_children(
    children: &[Arc<dyn VirtualWidget>],
    data_source: Option<&ExprValue>,
    payload: &RenderPayload,
) -> Result<Vec<ViewNode>, ViewError> {
    let Some(data_source) = data_source else {
        return children
            .iter()
            .map(|child| render_widget(child.as_ref(), payload))
            .collect();
    };

    let Value::Array(items) = payload.eval(data_source) else {
        // A non-list data source is an evaluation gap: nothing repeats.
        return Ok(Vec::new());
    };
    let Some(template) = children.first() else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let item_scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::from_json([
                ("currentItem".to_string(), item.clone()),
                ("index".to_string(), Value::from(index)),
            ]));
            let item_payload = payload.copy_with_chained_context(item_scope);
            render_widget(template.as_ref(), &item_payload)
        })
        .collect()
}

/// Children painted on top of each other.
pub struct StackWidget {
    base: WidgetBase,
    children: Vec<Arc<dyn VirtualWidget>>,
}

impl StackWidget {
    pub fn new(base: WidgetBase, children: Vec<Arc<dyn VirtualWidget>>) -> Self {
        Self { base, children }
    }
}

impl VirtualWidget for StackWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let children = self
            .children
            .iter()
            .map(|child| render_widget(child.as_ref(), payload))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ViewNode::Stack { children })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselProps {
    #[serde(default)]
    pub data_source: Option<ExprValue>,
    /// Scope variable naming the page controller that tracks the current
    /// page.
    #[serde(default)]
    pub controller: Option<String>,
}

/// Horizontally paged children with the same repeat semantics as flex.
pub struct CarouselWidget {
    base: WidgetBase,
    props: CarouselProps,
    children: Vec<Arc<dyn VirtualWidget>>,
}

impl CarouselWidget {
    pub fn new(base: WidgetBase, props: CarouselProps, children: Vec<Arc<dyn VirtualWidget>>) -> Self {
        Self { base, props, children }
    }
}

impl VirtualWidget for CarouselWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let children =
            render_flex_children(&self.children, self.props.data_source.as_ref(), payload)?;
        let initial_page = self
            .props
            .controller
            .as_deref()
            .and_then(|name| payload.ctx.scope.resolve(name))
            .and_then(|value| match value.as_controller() {
                Some(Controller::Page(controller)) => Some(controller.current_page()),
                _ => None,
            })
            .unwrap_or(0);
        Ok(ViewNode::Pager { children, initial_page })
    }
}

fn group_children(mut children: BuiltChildren) -> Vec<Arc<dyn VirtualWidget>> {
    children
        .shift_remove("children")
        .or_else(|| children.shift_remove("child"))
        .unwrap_or_default()
}

pub(super) fn register(registry: &mut WidgetRegistry) {
    registry.register("t/row", |props: FlexProps, def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(FlexWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            Axis::Horizontal,
            props,
            group_children(children),
        ));
        Ok(widget)
    });
    registry.register("t/column", |props: FlexProps, def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(FlexWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            Axis::Vertical,
            props,
            group_children(children),
        ));
        Ok(widget)
    });
    registry.register_json("t/stack", |def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(StackWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            group_children(children),
        ));
        Ok(widget)
    });
    registry.register("t/carousel", |props: CarouselProps, def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(CarouselWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
            group_children(children),
        ));
        Ok(widget)
    });
}
