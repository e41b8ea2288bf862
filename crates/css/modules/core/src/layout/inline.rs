//! Inline formatting context: greedy line breaking over words and atomic
//! inline boxes, with lines shortened around floats.
//!
//! Spec: CSS 2.2 §9.4.2 Inline formatting contexts
//! <https://www.w3.org/TR/CSS22/visuren.html#inline-formatting>
//!
//! Everything on a line is top-aligned. Inline boxes (spans) take the union
//! of their content and carry no inline padding.

use super::{FormattingContext, LayoutPass};
use crate::box_tree::{BoxKind, ContainingBlock, RenderId, RenderItem};
use crate::context::LayoutAborted;
use crate::host::DocumentContainer;
use css_box::{BoxSides, Rect};
use std::collections::HashMap;

/// Flattened inline content.
enum Piece {
    Word {
        owner: RenderId,
        width: f32,
        height: f32,
    },
    Space(f32),
    Atomic(RenderId),
    Float(RenderId),
    /// Out-of-flow box; only its static position is set here.
    Static(RenderId),
    Open(RenderId),
    Close,
}

enum Visit {
    Enter(RenderId),
    Close,
}

struct Line {
    top: f32,
    height: f32,
    cursor: f32,
    left: f32,
    right: f32,
    has_content: bool,
    pending_space: f32,
}

impl Line {
    fn new(context: &FormattingContext, top: f32, width: f32) -> Self {
        let (left, right) = context.line_span(top, width);
        Self {
            top,
            height: 0.0,
            cursor: left,
            left,
            right,
            has_content: false,
            pending_space: 0.0,
        }
    }

    /// Start of an item `width` wide, breaking the line first if it does not
    /// fit. Spaces at the start of a line are dropped.
    fn fit(&mut self, width: f32, strut: f32, context: &FormattingContext, container: f32) -> f32 {
        let space = if self.has_content {
            self.pending_space
        } else {
            0.0
        };
        self.pending_space = 0.0;
        if self.has_content && self.cursor + space + width > self.right {
            *self = Self::new(context, self.top + self.height.max(strut), container);
            return self.cursor;
        }
        self.cursor + space
    }

    fn place(&mut self, x: f32, width: f32, height: f32) {
        self.cursor = x + width;
        self.height = self.height.max(height);
        self.has_content = true;
    }
}

struct OpenSpan {
    id: RenderId,
    enclosing: Option<RenderId>,
    rect: Option<Rect>,
    start: (f32, f32),
}

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    fn flatten_inline(&self, items: &[RenderId]) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut stack: Vec<Visit> = items.iter().rev().map(|id| Visit::Enter(*id)).collect();
        while let Some(visit) = stack.pop() {
            let id = match visit {
                Visit::Close => {
                    pieces.push(Piece::Close);
                    continue;
                }
                Visit::Enter(id) => id,
            };
            let Some(item) = self.tree.get(id) else {
                continue;
            };
            if item.is_out_of_flow() {
                pieces.push(Piece::Static(id));
            } else if item.is_float() {
                pieces.push(Piece::Float(id));
            } else if let BoxKind::Text(text) = &item.kind {
                let font = &item.style.font;
                let space = self.host.text_width(" ", font);
                if text.starts_with(char::is_whitespace) {
                    pieces.push(Piece::Space(space));
                }
                for (index, word) in text.split_whitespace().enumerate() {
                    if index > 0 {
                        pieces.push(Piece::Space(space));
                    }
                    pieces.push(Piece::Word {
                        owner: id,
                        width: self.host.text_width(word, font),
                        height: font.line_height,
                    });
                }
                if text.ends_with(char::is_whitespace) {
                    pieces.push(Piece::Space(space));
                }
            } else if item.kind == BoxKind::Inline {
                pieces.push(Piece::Open(id));
                stack.push(Visit::Close);
                stack.extend(item.children.iter().rev().map(|child| Visit::Enter(*child)));
            } else {
                pieces.push(Piece::Atomic(id));
            }
        }
        pieces
    }

    /// Lay out inline-level `items` in lines `width` wide. `strut` is the
    /// minimum height of a non-empty line. Returns the height of all lines.
    pub(super) fn layout_inline(
        &mut self,
        items: &[RenderId],
        width: f32,
        strut: f32,
        context: &mut FormattingContext,
        depth: usize,
    ) -> Result<f32, LayoutAborted> {
        let pieces = self.flatten_inline(items);
        let child_block = ContainingBlock::new(width, None);
        let mut line = Line::new(context, 0.0, width);
        let mut fragments: HashMap<RenderId, Vec<Rect>> = HashMap::new();
        let mut spans: Vec<OpenSpan> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        // Every placed box with the span it sits in, in document order.
        let mut enclosed: Vec<(RenderId, Option<RenderId>)> = Vec::new();

        for piece in pieces {
            let enclosing = open.last().and_then(|index| spans.get(*index)).map(|span| span.id);
            let placed = match piece {
                Piece::Open(id) => {
                    spans.push(OpenSpan {
                        id,
                        enclosing,
                        rect: None,
                        start: (line.cursor, line.top),
                    });
                    open.push(spans.len() - 1);
                    None
                }
                Piece::Close => {
                    open.pop();
                    None
                }
                Piece::Space(space) => {
                    if line.has_content {
                        line.pending_space = space;
                    }
                    None
                }
                Piece::Word {
                    owner,
                    width: word_width,
                    height,
                } => {
                    let x = line.fit(word_width, strut, context, width);
                    line.place(x, word_width, height);
                    let rect = Rect::new(x, line.top, word_width, height);
                    let runs = fragments.entry(owner).or_insert_with(|| {
                        enclosed.push((owner, enclosing));
                        Vec::new()
                    });
                    match runs.last_mut() {
                        Some(last) if last.y.to_bits() == rect.y.to_bits() => {
                            *last = last.union(&rect);
                        }
                        _ => runs.push(rect),
                    }
                    Some(rect)
                }
                Piece::Atomic(id) => {
                    self.render(id, 0.0, 0.0, &child_block, context, false, depth + 1)?;
                    let Some(margin_box) = self.tree.get(id).map(RenderItem::margin_box) else {
                        continue;
                    };
                    let x = line.fit(margin_box.width, strut, context, width);
                    line.place(x, margin_box.width, margin_box.height);
                    self.offset_box(id, x, line.top);
                    enclosed.push((id, enclosing));
                    Some(Rect::new(x, line.top, margin_box.width, margin_box.height))
                }
                Piece::Float(id) => {
                    self.render(id, 0.0, 0.0, &child_block, context, false, depth + 1)?;
                    let Some(item) = self.tree.get(id) else {
                        continue;
                    };
                    let (float_type, margin_box) = (item.style.float, item.margin_box());
                    let (float_x, float_y) = context.place_float(
                        id,
                        float_type,
                        margin_box.width,
                        margin_box.height,
                        line.top,
                        width,
                    );
                    self.offset_box(id, float_x, float_y);
                    (line.left, line.right) = context.line_span(line.top, width);
                    if !line.has_content {
                        line.cursor = line.left;
                    }
                    enclosed.push((id, enclosing));
                    None
                }
                Piece::Static(id) => {
                    let x = line.cursor
                        + if line.has_content {
                            line.pending_space
                        } else {
                            0.0
                        };
                    self.render(id, x, line.top, &child_block, context, false, depth + 1)?;
                    enclosed.push((id, enclosing));
                    None
                }
            };
            if let Some(rect) = placed {
                for index in &open {
                    if let Some(span) = spans.get_mut(*index) {
                        span.rect = Some(span.rect.map_or(rect, |current| current.union(&rect)));
                    }
                }
            }
        }

        for (owner, runs) in fragments {
            let Some(bounds) = runs.iter().copied().reduce(|acc, rect| acc.union(&rect)) else {
                continue;
            };
            if let Some(item) = self.tree.get_mut(owner) {
                item.pos = bounds;
                item.sides = BoxSides::default();
                item.fragments = runs
                    .iter()
                    .map(|rect| rect.translate(-bounds.x, -bounds.y))
                    .collect();
            }
        }
        let mut span_rects: HashMap<RenderId, Rect> = HashMap::with_capacity(spans.len());
        for span in &spans {
            let rect = span
                .rect
                .unwrap_or_else(|| Rect::new(span.start.0, span.start.1, 0.0, 0.0));
            span_rects.insert(span.id, rect);
            if let Some(item) = self.tree.get_mut(span.id) {
                item.pos = rect;
                item.sides = BoxSides::default();
            }
            enclosed.push((span.id, span.enclosing));
        }
        // Content of a span is positioned relative to the span.
        for (id, enclosing) in enclosed {
            if let Some(rect) = enclosing.and_then(|span| span_rects.get(&span)) {
                self.offset_box(id, -rect.x, -rect.y);
            }
        }

        let last_line = if line.has_content {
            line.height.max(strut)
        } else {
            0.0
        };
        Ok(line.top + last_line)
    }
}
