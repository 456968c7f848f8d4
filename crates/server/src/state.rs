use ridesim::prelude::*;

pub struct AppState {
    pub machine: StageMachine,
    pub layers: LayerStore,
}

impl AppState {
    pub fn new(machine: StageMachine, layers: LayerStore) -> Self {
        Self { machine, layers }
    }
}
