//! Container and spacer widgets.

use std::sync::Arc;

use serde::Deserialize;
use trellis_api::ExprValue;

use crate::{
    BoxStyle, BuiltChildren, Length, RenderPayload, ViewError, ViewNode, VirtualWidget,
    WidgetBase, WidgetRegistry, render_widget, resolve_length,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProps {
    #[serde(default)]
    pub width: Option<ExprValue>,
    #[serde(default)]
    pub height: Option<ExprValue>,
}

/// A single-child box. Dimension props go through length resolution so
/// `"fill"`/`"auto"`/fixed sizes all parse; the style box itself comes
/// from common props like everywhere else.
pub struct ContainerWidget {
    base: WidgetBase,
    props: ContainerProps,
    child: Option<Arc<dyn VirtualWidget>>,
}

impl ContainerWidget {
    pub fn new(base: WidgetBase, props: ContainerProps, child: Option<Arc<dyn VirtualWidget>>) -> Self {
        Self { base, props, child }
    }

    fn dimension(&self, expr: &Option<ExprValue>, payload: &RenderPayload) -> Option<f64> {
        let length = resolve_length(&expr.as_ref().map(|e| payload.eval(e))?);
        length.fixed()
    }
}

impl VirtualWidget for ContainerWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let inner = match &self.child {
            Some(child) => render_widget(child.as_ref(), payload)?,
            None => ViewNode::Empty,
        };

        let width = self.dimension(&self.props.width, payload);
        let height = self.dimension(&self.props.height, payload);
        if width.is_none() && height.is_none() {
            return Ok(inner);
        }
        Ok(inner.boxed_with(BoxStyle { width, height, ..BoxStyle::default() }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerProps {
    #[serde(default)]
    pub flex: Option<u16>,
    #[serde(default)]
    pub size: Option<f64>,
}

/// Empty space: fixed when `size` is set, flexible otherwise.
pub struct SpacerWidget {
    base: WidgetBase,
    length: Length,
}

impl SpacerWidget {
    pub fn new(base: WidgetBase, props: SpacerProps) -> Self {
        let length = match (props.size, props.flex) {
            (Some(size), _) => Length::Fixed(size.max(0.0)),
            (None, Some(flex)) => Length::FillPortion(flex),
            (None, None) => Length::Fill,
        };
        Self { base, length }
    }

    pub fn length(&self) -> Length {
        self.length
    }
}

impl VirtualWidget for SpacerWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, _payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let node = match self.length.fixed() {
            Some(size) => ViewNode::Empty.boxed_with(BoxStyle {
                width: Some(size),
                height: Some(size),
                ..BoxStyle::default()
            }),
            None => ViewNode::Empty,
        };
        Ok(node)
    }
}

fn single_child(mut children: BuiltChildren) -> Option<Arc<dyn VirtualWidget>> {
    children
        .shift_remove("child")
        .or_else(|| children.shift_remove("children"))
        .and_then(|mut group| if group.is_empty() { None } else { Some(group.remove(0)) })
}

pub(super) fn register(registry: &mut WidgetRegistry) {
    registry.register("t/container", |props: ContainerProps, def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(ContainerWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
            single_child(children),
        ));
        Ok(widget)
    });
    registry.register("t/spacer", |props: SpacerProps, def, _children: BuiltChildren| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(SpacerWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
        ));
        Ok(widget)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderMode, TextStyle, widgets::TextWidget};
    use trellis_runtime::{DefaultScopeContext, ExecutionContext, Services};

    fn payload() -> RenderPayload {
        RenderPayload::new(
            ExecutionContext::new(DefaultScopeContext::root(), Arc::new(Services::bare()), "page"),
            RenderMode::Production,
        )
    }

    fn text_child(text: &str) -> Arc<dyn VirtualWidget> {
        Arc::new(TextWidget::new(
            WidgetBase::default(),
            crate::widgets::TextProps {
                text: Some(ExprValue::literal_str(text)),
                ..Default::default()
            },
        ))
    }

    #[test]
    fn container_without_dimensions_is_transparent() {
        let widget =
            ContainerWidget::new(WidgetBase::default(), ContainerProps::default(), Some(text_child("x")));
        let node = render_widget(&widget, &payload()).unwrap();
        assert_eq!(node, ViewNode::Text { text: "x".into(), style: TextStyle::default() });
    }

    #[test]
    fn fixed_dimensions_wrap_in_a_sized_box() {
        let widget = ContainerWidget::new(
            WidgetBase::default(),
            ContainerProps {
                width: Some(ExprValue::Literal(serde_json::json!(80))),
                height: None,
            },
            None,
        );
        let node = render_widget(&widget, &payload()).unwrap();
        match node {
            ViewNode::Box { style, .. } => assert_eq!(style.width, Some(80.0)),
            other => panic!("expected sized box, got {other:?}"),
        }
    }

    #[test]
    fn fill_dimension_is_not_a_fixed_size() {
        let widget = ContainerWidget::new(
            WidgetBase::default(),
            ContainerProps {
                width: Some(ExprValue::literal_str("fill")),
                height: None,
            },
            None,
        );
        // `fill` resolves through layout, not the style box.
        assert_eq!(render_widget(&widget, &payload()).unwrap(), ViewNode::Empty);
    }

    #[test]
    fn spacer_defaults_to_flex_fill() {
        let spacer = SpacerWidget::new(WidgetBase::default(), SpacerProps::default());
        assert_eq!(spacer.length(), Length::Fill);
        assert_eq!(render_widget(&spacer, &payload()).unwrap(), ViewNode::Empty);

        let fixed = SpacerWidget::new(
            WidgetBase::default(),
            SpacerProps { flex: None, size: Some(16.0) },
        );
        assert_eq!(fixed.length(), Length::Fixed(16.0));
    }
}
