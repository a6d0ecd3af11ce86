// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Named nodes of the model hierarchy.
//!
//! Every part of the network that logs owns an [`Entity`]. Entities are
//! registered with the [`Tracker`] when they are created, which gives them
//! the id their messages are emitted with and decides the level they are
//! emitted at.

use std::fmt;
use std::rc::Rc;

use crate::{Id, Tracker, create, destroy};

const SEPARATOR: &str = "::";

pub struct Entity {
    /// Local name, unique among its siblings.
    pub name: String,

    /// `None` only for the top level.
    pub parent: Option<Rc<Entity>>,

    pub id: Id,
    pub tracker: Tracker,

    /// Names from the top level down, joined with `::`.
    path: String,
}

impl Entity {
    fn register(tracker: &Tracker, parent: Option<&Rc<Entity>>, name: &str) -> Self {
        let path = match parent {
            Some(parent) => format!("{}{SEPARATOR}{name}", parent.path),
            None => name.to_string(),
        };
        let id = tracker.unique_id();
        tracker.add_entity(id, &path);

        let entity = Self {
            name: name.to_string(),
            parent: parent.cloned(),
            id,
            tracker: tracker.clone(),
            path,
        };
        create!(entity);
        entity
    }

    /// Create an entity below `parent`, sharing its tracker.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self::register(&parent.tracker, Some(parent), name)
    }

    /// The hierarchical name, e.g. `top::network::node3`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.path.clone()
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({} #{})", self.path, self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Create the root of an entity hierarchy.
#[must_use]
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    Rc::new(Entity::register(tracker, None, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_tracker;

    #[test]
    fn names_follow_the_hierarchy() {
        let tracker = create_tracker(file!());
        let top = toplevel(&tracker, "top");
        let network = Rc::new(Entity::new(&top, "network"));
        let router = Entity::new(&network, "router");

        assert_eq!(router.name, "router");
        assert_eq!(router.to_string(), "top::network::router");
        assert_eq!(router.parent.as_ref().map(|p| p.id), Some(network.id));
        assert!(top.parent.is_none());
        assert_ne!(router.id, network.id);
        assert_eq!(
            format!("{router:?}"),
            format!("Entity(top::network::router #{})", router.id)
        );
    }
}
