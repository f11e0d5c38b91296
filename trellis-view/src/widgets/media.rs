//! Icon and image widgets.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use trellis_api::ExprValue;

use crate::{
    BuiltChildren, RenderPayload, ViewError, ViewNode, VirtualWidget, WidgetBase, WidgetRegistry,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconProps {
    /// Icon family in the host's catalog, e.g. `material`.
    #[serde(default = "IconProps::default_family")]
    pub family: String,
    pub name: ExprValue,
    #[serde(default)]
    pub size: Option<ExprValue>,
    #[serde(default)]
    pub color: Option<ExprValue>,
}

impl IconProps {
    fn default_family() -> String {
        "material".to_string()
    }
}

/// Leaf-stateless icon. An unknown glyph is an evaluation gap: the widget
/// renders nothing rather than failing the pass.
pub struct IconWidget {
    base: WidgetBase,
    props: IconProps,
}

impl IconWidget {
    pub fn new(base: WidgetBase, props: IconProps) -> Self {
        Self { base, props }
    }
}

impl VirtualWidget for IconWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let name = payload.eval_string(&self.props.name);
        let Some(codepoint) = payload.ctx.services.resources.icon(&self.props.family, &name)
        else {
            tracing::debug!(family = %self.props.family, %name, "unknown icon glyph");
            return Ok(ViewNode::Empty);
        };

        Ok(ViewNode::Icon {
            codepoint,
            family: self.props.family.clone(),
            size: self.props.size.as_ref().and_then(|expr| payload.eval_number(expr)),
            color: self.props.color.as_ref().and_then(|expr| payload.eval_color(expr)),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    pub url: ExprValue,
    #[serde(default)]
    pub fit: Option<ExprValue>,
}

/// Leaf-stateless image reference. The host loads the bytes.
pub struct ImageWidget {
    base: WidgetBase,
    props: ImageProps,
}

impl ImageWidget {
    pub fn new(base: WidgetBase, props: ImageProps) -> Self {
        Self { base, props }
    }
}

impl VirtualWidget for ImageWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let url = payload.eval_string(&self.props.url);
        if url.is_empty() {
            return Ok(ViewNode::Empty);
        }
        let fit = self.props.fit.as_ref().and_then(|expr| match payload.eval(expr) {
            Value::String(fit) => Some(fit),
            _ => None,
        });
        Ok(ViewNode::Image { url, fit })
    }
}

pub(super) fn register(registry: &mut WidgetRegistry) {
    registry.register("t/icon", |props: IconProps, def, _children: BuiltChildren| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(IconWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
        ));
        Ok(widget)
    });
    registry.register("t/image", |props: ImageProps, def, _children: BuiltChildren| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(ImageWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
        ));
        Ok(widget)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderMode, render_widget};
    use serde_json::json;
    use trellis_runtime::{DefaultScopeContext, ExecutionContext, InMemoryResources, Services};

    fn payload() -> RenderPayload {
        let mut services = Services::bare();
        services.resources =
            Arc::new(InMemoryResources::new().with_icon("material", "home", 0xe88a));
        let scope = Arc::new(DefaultScopeContext::from_json([
            ("avatar".to_string(), json!("https://cdn.example.com/a.png")),
        ]));
        RenderPayload::new(
            ExecutionContext::new(scope, Arc::new(services), "page"),
            RenderMode::Production,
        )
    }

    #[test]
    fn icon_resolves_through_the_catalog() {
        let widget = IconWidget::new(
            WidgetBase::default(),
            IconProps {
                family: "material".to_string(),
                name: ExprValue::literal_str("home"),
                size: None,
                color: None,
            },
        );
        let node = render_widget(&widget, &payload()).unwrap();
        assert_eq!(
            node,
            ViewNode::Icon { codepoint: 0xe88a, family: "material".to_string(), size: None, color: None }
        );
    }

    #[test]
    fn unknown_icon_renders_nothing() {
        let widget = IconWidget::new(
            WidgetBase::default(),
            IconProps {
                family: "material".to_string(),
                name: ExprValue::literal_str("nope"),
                size: None,
                color: None,
            },
        );
        assert_eq!(render_widget(&widget, &payload()).unwrap(), ViewNode::Empty);
    }

    #[test]
    fn image_url_evaluates_from_scope() {
        let widget = ImageWidget::new(
            WidgetBase::default(),
            ImageProps { url: ExprValue::Expr("avatar".into()), fit: None },
        );
        let node = render_widget(&widget, &payload()).unwrap();
        assert_eq!(
            node,
            ViewNode::Image { url: "https://cdn.example.com/a.png".to_string(), fit: None }
        );
    }
}
