use std::sync::Arc;

use specs::prelude::*;

use super::components::{Position, Viewshed};
use super::resources::SightContext;
use crate::fov::FovEngine;

/// Recomputes dirty viewsheds against the current sight snapshot.
#[derive(Default)]
pub struct ViewshedSystem;

impl<'a> System<'a> for ViewshedSystem {
    type SystemData = (
        ReadExpect<'a, SightContext>,
        ReadExpect<'a, Arc<FovEngine>>,
        WriteStorage<'a, Viewshed>,
        ReadStorage<'a, Position>,
    );

    fn run(&mut self, (sight, fov, mut viewsheds, positions): Self::SystemData) {
        for (viewshed, pos) in (&mut viewsheds, &positions).join() {
            if !viewshed.dirty {
                continue;
            }
            let mut visible: Vec<_> = fov
                .compute_fov(&*sight, pos.point, viewshed.radius)
                .into_iter()
                .collect();
            visible.sort_by_key(|p| (p.y, p.x));
            viewshed.visible = visible;
            viewshed.dirty = false;
        }
    }
}
