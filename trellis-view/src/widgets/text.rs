//! Text widget.

use std::sync::Arc;

use serde::Deserialize;
use trellis_api::ExprValue;

use crate::{
    BuiltChildren, RenderPayload, TextStyle, ViewError, ViewNode, VirtualWidget, WidgetBase,
    WidgetRegistry,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default)]
    pub text: Option<ExprValue>,
    #[serde(default)]
    pub size: Option<ExprValue>,
    #[serde(default)]
    pub color: Option<ExprValue>,
    #[serde(default)]
    pub weight: Option<ExprValue>,
    #[serde(default)]
    pub max_lines: Option<u32>,
}

/// Leaf-stateless text. A missing or null text expression renders the
/// empty string, never an error.
pub struct TextWidget {
    base: WidgetBase,
    props: TextProps,
}

impl TextWidget {
    pub fn new(base: WidgetBase, props: TextProps) -> Self {
        Self { base, props }
    }
}

impl VirtualWidget for TextWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let text = self
            .props
            .text
            .as_ref()
            .map(|expr| payload.eval_string(expr))
            .unwrap_or_default();

        let style = TextStyle {
            size: self.props.size.as_ref().and_then(|expr| payload.eval_number(expr)),
            color: self.props.color.as_ref().and_then(|expr| payload.eval_color(expr)),
            weight: self.props.weight.as_ref().and_then(|expr| {
                match payload.eval(expr) {
                    serde_json::Value::String(weight) => Some(weight),
                    _ => None,
                }
            }),
            max_lines: self.props.max_lines,
        };
        Ok(ViewNode::Text { text, style })
    }
}

pub(super) fn register(registry: &mut WidgetRegistry) {
    registry.register("t/text", |props: TextProps, def, _children: BuiltChildren| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(TextWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
        ));
        Ok(widget)
    });
}
