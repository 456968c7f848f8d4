mod layer;
mod trip;
pub use layer::*;
pub use trip::*;
