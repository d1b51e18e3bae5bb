//! Undo/redo functionality for tracking and reversing user actions.
//!
//! Tracks element creation, deletion, movement, resizing, property edits and
//! canvas configuration changes. Each action knows how to produce its own
//! inverse when applied, so redo is just applying the inverse of an undo.

use crate::constants::MAX_UNDO_HISTORY;
use crate::geometry::ElementRect;
use crate::types::{CanvasConfig, CanvasElement, ElementId, Template};
use serde::{Deserialize, Serialize};

/// Represents different types of actions that can be undone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoAction {
    /// An element was moved from one position to another
    ElementMoved {
        element_id: ElementId,
        old_position: (f32, f32),
        new_position: (f32, f32),
    },
    /// An element was resized (position may have moved with the anchor)
    ElementResized {
        element_id: ElementId,
        old_rect: ElementRect,
        new_rect: ElementRect,
    },
    /// An element was created
    ElementCreated { element_id: ElementId },
    /// An element was deleted from the given z-order index
    ElementDeleted {
        element: CanvasElement,
        index: usize,
    },
    /// An element's payload or variable binding was edited
    PropertyChanged {
        element_id: ElementId,
        old_element: CanvasElement,
        new_element: CanvasElement,
    },
    /// The canvas configuration changed (size, background image or geometry)
    ConfigChanged {
        old_config: CanvasConfig,
        new_config: CanvasConfig,
    },
}

/// Manages undo/redo history for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UndoHistory {
    /// Stack of actions that can be undone
    #[serde(skip)]
    undo_stack: Vec<UndoAction>,
    /// Stack of actions that can be redone
    #[serde(skip)]
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action to the undo history.
    ///
    /// This clears the redo stack since a new action invalidates any
    /// previously undone actions.
    pub fn push_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();

        // Limit undo history size
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Adds an action to the undo history without clearing the redo stack.
    ///
    /// Used when a redo puts its inverse back on the undo stack; the
    /// remaining redo chain must survive.
    pub fn push_action_preserving_redo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Records a property edit, coalescing consecutive edits to the same
    /// element into one entry so a slider drag doesn't flood the history.
    pub fn push_property_change(
        &mut self,
        element_id: ElementId,
        old_element: CanvasElement,
        new_element: CanvasElement,
    ) {
        if let Some(UndoAction::PropertyChanged {
            element_id: top_id,
            new_element: top_new,
            ..
        }) = self.undo_stack.last_mut()
        {
            if *top_id == element_id && self.redo_stack.is_empty() {
                *top_new = new_element;
                return;
            }
        }
        self.push_action(UndoAction::PropertyChanged {
            element_id,
            old_element,
            new_element,
        });
    }

    /// Records a configuration edit with the same coalescing as property
    /// edits.
    pub fn push_config_change(&mut self, old_config: CanvasConfig, new_config: CanvasConfig) {
        if let Some(UndoAction::ConfigChanged {
            new_config: top_new,
            ..
        }) = self.undo_stack.last_mut()
        {
            if self.redo_stack.is_empty() {
                *top_new = new_config;
                return;
            }
        }
        self.push_action(UndoAction::ConfigChanged {
            old_config,
            new_config,
        });
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent action from the undo stack.
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Clears all undo and redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Extension methods for applying undo/redo actions to a template.
pub trait UndoableTemplate {
    /// Applies an undo action to reverse it, returning the inverse action.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Applies a redo action to re-apply it.
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableTemplate for Template {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::ElementMoved {
                element_id,
                old_position,
                new_position,
            } => {
                let element = self.element_mut(element_id)?;
                element.x = old_position.0;
                element.y = old_position.1;
                Some(UndoAction::ElementMoved {
                    element_id: *element_id,
                    old_position: *new_position,
                    new_position: *old_position,
                })
            }
            UndoAction::ElementResized {
                element_id,
                old_rect,
                new_rect,
            } => {
                let element = self.element_mut(element_id)?;
                element.x = old_rect.x;
                element.y = old_rect.y;
                element.payload.set_size(old_rect.width, old_rect.height);
                Some(UndoAction::ElementResized {
                    element_id: *element_id,
                    old_rect: *new_rect,
                    new_rect: *old_rect,
                })
            }
            UndoAction::ElementCreated { element_id } => {
                let index = self.elements.iter().position(|e| e.id == *element_id)?;
                let element = self.elements.remove(index);
                Some(UndoAction::ElementDeleted { element, index })
            }
            UndoAction::ElementDeleted { element, index } => {
                let index = (*index).min(self.elements.len());
                self.elements.insert(index, element.clone());
                Some(UndoAction::ElementCreated {
                    element_id: element.id,
                })
            }
            UndoAction::PropertyChanged {
                element_id,
                old_element,
                new_element,
            } => {
                let element = self.element_mut(element_id)?;
                *element = old_element.clone();
                Some(UndoAction::PropertyChanged {
                    element_id: *element_id,
                    old_element: new_element.clone(),
                    new_element: old_element.clone(),
                })
            }
            UndoAction::ConfigChanged {
                old_config,
                new_config,
            } => {
                self.config = old_config.clone();
                Some(UndoAction::ConfigChanged {
                    old_config: new_config.clone(),
                    new_config: old_config.clone(),
                })
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is just applying the reverse of an undo
        self.apply_undo(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_element() -> (Template, ElementId) {
        let mut template = Template::new();
        let id = template.add_element(CanvasElement::new_text(100.0, 100.0, "v".into()));
        (template, id)
    }

    #[test]
    fn undo_move_restores_position_and_returns_inverse() {
        let (mut template, id) = template_with_element();
        template.element_mut(&id).unwrap().x = 250.0;

        let action = UndoAction::ElementMoved {
            element_id: id,
            old_position: (100.0, 100.0),
            new_position: (250.0, 100.0),
        };
        let inverse = template.apply_undo(&action).unwrap();

        assert_eq!(template.element(&id).unwrap().x, 100.0);
        // Redoing the inverse puts the element back.
        template.apply_redo(&inverse).unwrap();
        assert_eq!(template.element(&id).unwrap().x, 250.0);
    }

    #[test]
    fn undo_resize_restores_rect() {
        let (mut template, id) = template_with_element();
        let action = UndoAction::ElementResized {
            element_id: id,
            old_rect: ElementRect::new(100.0, 100.0, 100.0, 50.0),
            new_rect: ElementRect::new(100.0, 100.0, 200.0, 80.0),
        };
        template
            .element_mut(&id)
            .unwrap()
            .payload
            .set_size(200.0, 80.0);

        template.apply_undo(&action).unwrap();

        let element = template.element(&id).unwrap();
        assert_eq!(element.payload.resolved_size(), (100.0, 50.0));
    }

    #[test]
    fn undo_create_deletes_and_round_trips() {
        let (mut template, id) = template_with_element();
        let action = UndoAction::ElementCreated { element_id: id };

        let inverse = template.apply_undo(&action).unwrap();
        assert!(template.elements.is_empty());

        template.apply_redo(&inverse).unwrap();
        assert!(template.element(&id).is_some());
    }

    #[test]
    fn undo_delete_restores_at_original_index() {
        let mut template = Template::new();
        let first = template.add_element(CanvasElement::new_text(0.0, 0.0, "a".into()));
        let second = CanvasElement::new_text(10.0, 0.0, "b".into());
        let second_id = second.id;
        template.add_element(second.clone());
        template.add_element(CanvasElement::new_text(20.0, 0.0, "c".into()));

        template.remove_element(&second_id);
        let action = UndoAction::ElementDeleted {
            element: second,
            index: 1,
        };
        template.apply_undo(&action).unwrap();

        assert_eq!(template.elements[0].id, first);
        assert_eq!(template.elements[1].id, second_id);
    }

    #[test]
    fn undo_config_change_restores_canvas() {
        let mut template = Template::new();
        let old_config = template.config.clone();
        template.config.width = 400.0;
        let new_config = template.config.clone();

        let action = UndoAction::ConfigChanged {
            old_config: old_config.clone(),
            new_config,
        };
        template.apply_undo(&action).unwrap();

        assert_eq!(template.config, old_config);
    }

    #[test]
    fn property_changes_coalesce_per_element() {
        let (_, id) = template_with_element();
        let mut history = UndoHistory::new();
        let base = CanvasElement::new_text(0.0, 0.0, "v".into());
        let mut step_one = base.clone();
        step_one.variable_name = "w".into();
        let mut step_two = base.clone();
        step_two.variable_name = "x".into();

        history.push_property_change(id, base.clone(), step_one);
        history.push_property_change(id, base.clone(), step_two.clone());

        // Both edits collapsed into a single entry holding the final value.
        let action = history.pop_undo().unwrap();
        assert!(history.pop_undo().is_none());
        match action {
            UndoAction::PropertyChanged { new_element, .. } => {
                assert_eq!(new_element.variable_name, "x");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn history_is_bounded() {
        let mut history = UndoHistory::new();
        for i in 0..(MAX_UNDO_HISTORY + 10) {
            history.push_action(UndoAction::ElementMoved {
                element_id: uuid::Uuid::new_v4(),
                old_position: (i as f32, 0.0),
                new_position: (0.0, 0.0),
            });
        }
        let mut count = 0;
        while history.pop_undo().is_some() {
            count += 1;
        }
        assert_eq!(count, MAX_UNDO_HISTORY);
    }
}
