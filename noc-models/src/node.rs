// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use noc_track::entity::Entity;

use crate::config::NocConfig;
use crate::mesh::{Mesh, NodeId};
use crate::router::Router;
use crate::selection::{Selection, build_selection};

/// A tile of the mesh: one router and the selection strategy it uses.
pub struct Node {
    pub entity: Rc<Entity>,
    id: NodeId,
    pub(crate) router: Router,
    pub(crate) selection: Box<dyn Selection>,
}

impl Node {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, id: NodeId, mesh: &Mesh, config: &NocConfig) -> Self {
        let entity = Rc::new(Entity::new(parent, &format!("node{id}")));
        let router = Router::new(&entity, id, config);
        let selection = build_selection(config.effective_selection(), id, mesh, config);
        Self {
            entity,
            id,
            router,
            selection,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn selection(&self) -> &dyn Selection {
        self.selection.as_ref()
    }
}
