//! Shared decoration applied around every rendered widget.
//!
//! Common props cover the style box model (padding/margin/background/
//! border/radius/sizing/alignment) and tap-action wiring. Visibility
//! gating happens earlier, in the render pipeline, so a hidden widget
//! never reaches this code.

use serde_json::Value;
use trellis_api::{CommonProps, ExprValue, StyleDef};

use crate::{BoxStyle, Constraints, EdgeInsets, RenderPayload, Size, TapBinding, ViewNode};

/// Wrap a rendered node with its common decoration: the resolved style box
/// first, then the tap target so the whole decorated area is tappable.
pub fn apply_common_props(
    node: ViewNode,
    props: Option<&CommonProps>,
    payload: &RenderPayload,
) -> ViewNode {
    let Some(props) = props else {
        return node;
    };

    let mut style = props
        .style
        .as_ref()
        .map(|style| resolve_style(style, payload))
        .unwrap_or_default();
    if let Some(align) = &props.align {
        if let Value::String(alignment) = payload.eval(align) {
            style.alignment = Some(alignment);
        }
    }
    let mut decorated = node.boxed_with(style);

    if let Some(on_click) = &props.on_click {
        let binding = payload.bindings.register(TapBinding {
            flow: on_click.clone(),
            ctx: payload.ctx.clone(),
        });
        decorated = ViewNode::Tappable {
            binding,
            inkwell: on_click.inkwell,
            child: std::boxed::Box::new(decorated),
        };
    }
    decorated
}

/// Evaluate a declared style into concrete box attributes. Dimensions are
/// clamped to sane bounds; unparseable entries are evaluation gaps and
/// resolve to absent.
pub fn resolve_style(style: &StyleDef, payload: &RenderPayload) -> BoxStyle {
    let size = Constraints::UNBOUNDED.constrain(Size::new(
        eval_dimension(&style.width, payload).unwrap_or(f64::NAN),
        eval_dimension(&style.height, payload).unwrap_or(f64::NAN),
    ));

    BoxStyle {
        padding: eval_insets(&style.padding, payload),
        margin: eval_insets(&style.margin, payload),
        background_color: eval_color(&style.background_color, payload),
        border_color: eval_color(&style.border_color, payload),
        border_width: eval_dimension(&style.border_width, payload),
        border_radius: eval_dimension(&style.border_radius, payload),
        width: style.width.as_ref().map(|_| size.width).filter(|value| *value > 0.0),
        height: style.height.as_ref().map(|_| size.height).filter(|value| *value > 0.0),
        opacity: eval_dimension(&style.opacity, payload).map(|value| value.clamp(0.0, 1.0)),
        alignment: None,
    }
}

fn eval_color(expr: &Option<ExprValue>, payload: &RenderPayload) -> Option<String> {
    expr.as_ref().and_then(|expr| payload.eval_color(expr))
}

fn eval_dimension(expr: &Option<ExprValue>, payload: &RenderPayload) -> Option<f64> {
    expr.as_ref().and_then(|expr| payload.eval_number(expr))
}

/// Insets accept a single number (uniform) or an object with per-edge
/// keys.
fn eval_insets(expr: &Option<ExprValue>, payload: &RenderPayload) -> EdgeInsets {
    let Some(expr) = expr else {
        return EdgeInsets::default();
    };
    match payload.eval(expr) {
        Value::Number(number) => number
            .as_f64()
            .filter(|value| value.is_finite())
            .map(EdgeInsets::all)
            .unwrap_or_default(),
        Value::Object(map) => {
            let edge = |key: &str| {
                map.get(key).and_then(Value::as_f64).filter(|value| value.is_finite()).unwrap_or(0.0)
            };
            EdgeInsets {
                left: edge("left"),
                top: edge("top"),
                right: edge("right"),
                bottom: edge("bottom"),
            }
        }
        _ => EdgeInsets::default(),
    }
}
