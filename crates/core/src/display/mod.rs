use std::collections::VecDeque;

use crate::ElementId;

/// Ordered child list of the trail container, oldest first.
#[derive(Debug, Default, Clone)]
pub struct Display {
    children: VecDeque<ElementId>,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, id: ElementId) {
        self.children.push_back(id);
    }

    /// Removes `id` if it is still attached. Returns whether anything was
    /// removed, so repeated removals are harmless.
    pub fn remove(&mut self, id: ElementId) -> bool {
        match self.children.iter().position(|child| *child == id) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn pop_oldest(&mut self) -> Option<ElementId> {
        self.children.pop_front()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.children.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in attach order.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.children.iter().copied()
    }
}
