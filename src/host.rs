//! Host page seam: container lookup, sizing and legend output.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::LegendView;
use crate::core::Viewport;

/// Host-assigned element identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Where the widget should mount: a CSS selector or an element the host
/// already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainerTarget {
    Element(ElementId),
    Selector(String),
}

impl fmt::Display for ContainerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(id) => write!(f, "element #{}", id.0),
            Self::Selector(selector) => f.write_str(selector),
        }
    }
}

impl From<&str> for ContainerTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<ElementId> for ContainerTarget {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

/// A resolved, existing container element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHandle {
    pub element: ElementId,
}

/// What the widget needs from the page hosting it.
pub trait HostSurface {
    fn resolve_container(&self, target: &ContainerTarget) -> Option<ContainerHandle>;

    /// Current client size of the container, if it has been laid out.
    fn container_size(&self, container: &ContainerHandle) -> Option<Viewport>;

    /// Replaces the legend overlay. `None` removes it.
    fn render_legend(&mut self, container: &ContainerHandle, legend: Option<&LegendView>);

    /// Removes everything the widget mounted into the container.
    fn clear_container(&mut self, container: &ContainerHandle);
}

#[derive(Debug, Default)]
struct MemoryHostState {
    elements: IndexMap<String, (ElementId, Viewport)>,
    legends: IndexMap<ElementId, Option<LegendView>>,
    legend_renders: usize,
    cleared: Vec<ElementId>,
}

/// In-memory host page keyed by selector.
///
/// Clones share state, so a caller can keep one to inspect the legend
/// while the widget owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Rc<RefCell<MemoryHostState>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an element reachable through `selector`.
    #[must_use]
    pub fn with_element(self, selector: &str, size: Viewport) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = ElementId(state.elements.len() as u64 + 1);
            state.elements.insert(selector.to_owned(), (id, size));
        }
        self
    }

    pub fn set_element_size(&self, selector: &str, size: Viewport) {
        if let Some(entry) = self.state.borrow_mut().elements.get_mut(selector) {
            entry.1 = size;
        }
    }

    #[must_use]
    pub fn element_id(&self, selector: &str) -> Option<ElementId> {
        self.state.borrow().elements.get(selector).map(|(id, _)| *id)
    }

    /// Legend currently shown in `element`, if any.
    #[must_use]
    pub fn legend(&self, element: ElementId) -> Option<LegendView> {
        self.state.borrow().legends.get(&element).cloned().flatten()
    }

    #[must_use]
    pub fn legend_renders(&self) -> usize {
        self.state.borrow().legend_renders
    }

    #[must_use]
    pub fn was_cleared(&self, element: ElementId) -> bool {
        self.state.borrow().cleared.contains(&element)
    }
}

impl HostSurface for MemoryHost {
    fn resolve_container(&self, target: &ContainerTarget) -> Option<ContainerHandle> {
        let state = self.state.borrow();
        let element = match target {
            ContainerTarget::Selector(selector) => state.elements.get(selector).map(|(id, _)| *id),
            ContainerTarget::Element(id) => state
                .elements
                .values()
                .any(|(known, _)| known == id)
                .then_some(*id),
        }?;
        Some(ContainerHandle { element })
    }

    fn container_size(&self, container: &ContainerHandle) -> Option<Viewport> {
        self.state
            .borrow()
            .elements
            .values()
            .find(|(id, _)| *id == container.element)
            .map(|(_, size)| *size)
    }

    fn render_legend(&mut self, container: &ContainerHandle, legend: Option<&LegendView>) {
        let mut state = self.state.borrow_mut();
        state.legend_renders += 1;
        state.legends.insert(container.element, legend.cloned());
    }

    fn clear_container(&mut self, container: &ContainerHandle) {
        let mut state = self.state.borrow_mut();
        state.legends.shift_remove(&container.element);
        state.cleared.push(container.element);
    }
}
