//! Incremental layout core.
//!
//! A [`Document`] owns the element tree and the render tree built from it.
//! Styles come from the selector index and style sharing cache of
//! `style_engine`; layout walks the render tree with damage tracking and
//! generation-stamped caches, resolves positioned boxes, and exposes paint
//! order and hit testing to the host through [`DocumentContainer`].
//!
//! Layout is single-threaded and synchronous. The host can cancel a pass at
//! box boundaries; an aborted pass is discarded and the next one starts over.

// Render items, containing blocks and float bookkeeping
pub mod box_tree;
pub use box_tree::{BoxKind, ContainingBlock, RenderId, RenderItem, RenderTree, SizeMode};

// Damage bits and per-box caches
pub mod cache;
pub mod damage;
pub use cache::LayoutStats;
pub use damage::DamageFlags;

// Pass-wide state and cancellation
mod context;
pub use context::{LayoutAborted, LayoutConfig, LayoutContext};

// Host callbacks
mod host;
pub use host::DocumentContainer;

// DOM side
mod construct;
mod document;
mod element;
pub use document::Document;
pub use element::{Element, ElementKind};

// Layout passes
mod layout;
pub use layout::FormattingContext;

// Paint order and hit testing
mod paint;
pub use paint::{PaintItem, Painter};
