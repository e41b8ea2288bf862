//! DOM-side element data and the element-kind capability table.

use crate::box_tree::RenderId;
use crate::host::DocumentContainer;
use css_box::Size;
use css_selectors::Atom;
use smallvec::SmallVec;
use std::sync::Arc;
use style_engine::ComputedStyle;

/// What an element is, as far as layout cares.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ElementKind {
    #[default]
    Generic,
    Text,
    /// `<img>`: sized by the host once `src` has loaded. `width`/`height`
    /// attributes override the intrinsic size.
    Image {
        src: String,
        width: Option<f32>,
        height: Option<f32>,
    },
    /// Other replaced content with a fixed default size.
    Replaced { size: Size },
    Comment,
}

impl ElementKind {
    /// Kind for a freshly created element with `tag` (lowercase).
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "img" => Self::Image {
                src: String::new(),
                width: None,
                height: None,
            },
            "canvas" | "video" | "iframe" | "embed" | "object" => Self::Replaced {
                size: Size::new(300.0, 150.0),
            },
            "input" => Self::Replaced {
                size: Size::new(150.0, 20.0),
            },
            "select" => Self::Replaced {
                size: Size::new(150.0, 24.0),
            },
            "textarea" => Self::Replaced {
                size: Size::new(200.0, 100.0),
            },
            _ => Self::Generic,
        }
    }

    #[inline]
    pub const fn generates_box(&self) -> bool {
        !matches!(self, Self::Comment)
    }

    #[inline]
    pub const fn is_replaced(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::Replaced { .. })
    }

    /// Text and comments are not elements for selector matching.
    #[inline]
    pub const fn is_element(&self) -> bool {
        !matches!(self, Self::Text | Self::Comment)
    }

    /// Image source, if this is an image.
    #[inline]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Image { src, .. } => Some(src),
            _ => None,
        }
    }

    /// Intrinsic size of replaced content. Images ask the host, which may
    /// answer `0x0` until the resource is ready.
    pub fn content_size<C: DocumentContainer + ?Sized>(&self, host: &C) -> Option<Size> {
        match self {
            Self::Image { src, width, height } => {
                let natural = if src.is_empty() {
                    Size::default()
                } else {
                    host.image_size(src)
                };
                Some(match (*width, *height) {
                    (Some(width), Some(height)) => Size::new(width, height),
                    (Some(width), None) if natural.width > 0.0 => {
                        Size::new(width, width * natural.height / natural.width)
                    }
                    (None, Some(height)) if natural.height > 0.0 => {
                        Size::new(height * natural.width / natural.height, height)
                    }
                    (Some(width), None) => Size::new(width, natural.height),
                    (None, Some(height)) => Size::new(natural.width, height),
                    (None, None) => natural,
                })
            }
            Self::Replaced { size } => Some(*size),
            _ => None,
        }
    }

    /// Apply a layout-relevant attribute. Returns `true` if the kind changed.
    pub fn parse_attribute(&mut self, name: &str, value: &str) -> bool {
        match self {
            Self::Image { src, width, height } => match name {
                "src" => {
                    value.trim().clone_into(src);
                    true
                }
                "width" => {
                    *width = parse_dimension(value);
                    true
                }
                "height" => {
                    *height = parse_dimension(value);
                    true
                }
                _ => false,
            },
            Self::Replaced { size } => match (name, parse_dimension(value)) {
                ("width", Some(width)) => {
                    size.width = width;
                    true
                }
                ("height", Some(height)) => {
                    size.height = height;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

/// HTML dimension attribute: a non-negative number with an optional `px`.
fn parse_dimension(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite() && *parsed >= 0.0)
}

/// One node of the document tree.
#[derive(Clone, Debug, Default)]
pub struct Element {
    pub(crate) tag: Option<Atom>,
    pub(crate) id: Option<Atom>,
    pub(crate) classes: SmallVec<Atom, 4>,
    pub(crate) attributes: SmallVec<(Atom, String), 4>,
    pub(crate) kind: ElementKind,
    pub(crate) text: String,
    pub(crate) style: Arc<ComputedStyle>,
    pub(crate) render: Option<RenderId>,
}

impl Element {
    #[inline]
    pub const fn tag(&self) -> Option<Atom> {
        self.tag
    }

    #[inline]
    pub const fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Text content of a text node; empty otherwise.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn style(&self) -> &ComputedStyle {
        &self.style
    }

    /// The box generated for this element by the last render tree build.
    #[inline]
    pub const fn render_id(&self) -> Option<RenderId> {
        self.render
    }

    pub fn attribute(&self, name: Atom) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, value)| value.as_str())
    }
}
