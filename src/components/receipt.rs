//! The ticket container.

use super::Component;
use crate::ir::Op;

type Child = Box<dyn Component + Send + Sync>;

/// A whole ticket: children printed top to bottom, then an optional cut.
///
/// ```
/// use raivo::components::*;
///
/// let has_notes = false;
/// let ticket = Receipt::new()
///     .child(Header::new("TAKEAWAY"))
///     .children([ItemLine::new(1, "Tom Yum"), ItemLine::new(2, "Rice")])
///     .child_if(has_notes, Text::new("Extra napkins").invert())
///     .child(Spacer::lines(5))
///     .cut();
///
/// assert_eq!(ticket.compile().texts(), vec!["TAKEAWAY", "1 Tom Yum", "2 Rice"]);
/// ```
#[derive(Default)]
pub struct Receipt {
    children: Vec<Child>,
    cut: Option<Op>,
}

impl Receipt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child<C: Component + Send + Sync + 'static>(mut self, component: C) -> Self {
        self.children.push(Box::new(component));
        self
    }

    pub fn children<I, C>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Component + Send + Sync + 'static,
    {
        self.children
            .extend(components.into_iter().map(|c| Box::new(c) as Child));
        self
    }

    /// Add a child only when `cond` holds.
    pub fn child_if<C: Component + Send + Sync + 'static>(self, cond: bool, component: C) -> Self {
        if cond { self.child(component) } else { self }
    }

    /// Finish with a full cut.
    pub fn cut(mut self) -> Self {
        self.cut = Some(Op::Cut { partial: false });
        self
    }

    /// Finish with a partial cut, leaving the ticket hanging from the roll.
    pub fn partial_cut(mut self) -> Self {
        self.cut = Some(Op::Cut { partial: true });
        self
    }
}

impl Component for Receipt {
    fn emit(&self, ops: &mut Vec<Op>) {
        for child in &self.children {
            child.emit(ops);
        }
        ops.extend(self.cut.clone());
    }
}
