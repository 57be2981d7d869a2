use bracket_geometry::prelude::Point;
use specs::prelude::{Component, NullStorage, VecStorage};

use super::Act;

#[derive(Clone, Debug)]
pub struct Position {
    pub point: Point,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Name(pub String);

impl Component for Name {
    type Storage = VecStorage<Self>;
}

/// The actor's action, invoked when its turn comes due.
pub struct Brain(pub Box<dyn Act>);

impl Component for Brain {
    type Storage = VecStorage<Self>;
}

/// Marks an actor for removal at the end of the current tick.
#[derive(Default)]
pub struct Expired;

impl Component for Expired {
    type Storage = NullStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct Viewshed {
    pub radius: i32,
    pub dirty: bool,
    pub visible: Vec<Point>,
}

impl Component for Viewshed {
    type Storage = VecStorage<Self>;
}
