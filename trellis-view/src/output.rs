//! The render-description tree handed to the host view system.
//!
//! A [`ViewNode`] is plain data: the runtime's finished output for one
//! render pass. The host walks it and produces pixels with whatever
//! toolkit it embeds. Tap targets reference bindings collected during the
//! pass (see `payload::TapBindings`) so the description itself stays
//! serializable.

use serde::Serialize;

/// One node of rendered output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ViewNode {
    /// Nothing: a zero-size placeholder.
    Empty,

    Text {
        text: String,
        #[serde(skip_serializing_if = "TextStyle::is_default")]
        style: TextStyle,
    },

    Icon {
        codepoint: u32,
        family: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },

    Image {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fit: Option<String>,
    },

    Row {
        children: Vec<ViewNode>,
        #[serde(skip_serializing_if = "FlexAttrs::is_default")]
        attrs: FlexAttrs,
    },

    Column {
        children: Vec<ViewNode>,
        #[serde(skip_serializing_if = "FlexAttrs::is_default")]
        attrs: FlexAttrs,
    },

    /// Children painted on top of each other, first at the bottom.
    Stack { children: Vec<ViewNode> },

    /// Horizontally paged children (carousel).
    Pager { children: Vec<ViewNode>, initial_page: usize },

    /// The style box: decoration applied around a child.
    Box {
        style: BoxStyle,
        child: std::boxed::Box<ViewNode>,
    },

    /// A tap target. `binding` indexes into the pass's tap bindings.
    Tappable {
        binding: usize,
        inkwell: bool,
        child: std::boxed::Box<ViewNode>,
    },

    /// Development-mode inline diagnostic for a failed render.
    RenderError { ref_name: String, message: String },
}

impl ViewNode {
    /// Wrap in a style box, skipping the wrapper for an empty style.
    pub fn boxed_with(self, style: BoxStyle) -> ViewNode {
        if style.is_default() {
            self
        } else {
            ViewNode::Box { style, child: std::boxed::Box::new(self) }
        }
    }

    /// Total number of nodes in this subtree, for diagnostics.
    pub fn node_count(&self) -> usize {
        1 + match self {
            ViewNode::Row { children, .. }
            | ViewNode::Column { children, .. }
            | ViewNode::Stack { children }
            | ViewNode::Pager { children, .. } => {
                children.iter().map(ViewNode::node_count).sum()
            }
            ViewNode::Box { child, .. } | ViewNode::Tappable { child, .. } => child.node_count(),
            _ => 0,
        }
    }
}

/// Resolved text styling.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
}

impl TextStyle {
    pub fn is_default(&self) -> bool {
        *self == TextStyle::default()
    }
}

/// Resolved main/cross-axis attributes for row/column output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_axis_alignment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_axis_alignment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
}

impl FlexAttrs {
    pub fn is_default(&self) -> bool {
        *self == FlexAttrs::default()
    }
}

/// Uniform or per-edge spacing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeInsets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl EdgeInsets {
    pub fn all(value: f64) -> Self {
        Self { left: value, top: value, right: value, bottom: value }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        *self == EdgeInsets::default()
    }
}

/// The resolved style box applied around a rendered widget.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxStyle {
    #[serde(skip_serializing_if = "EdgeInsets::is_zero")]
    pub padding: EdgeInsets,
    #[serde(skip_serializing_if = "EdgeInsets::is_zero")]
    pub margin: EdgeInsets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

impl BoxStyle {
    pub fn is_default(&self) -> bool {
        *self == BoxStyle::default()
    }
}
