mod authenticator;
mod reconcile;

pub use authenticator::*;
pub use reconcile::*;
