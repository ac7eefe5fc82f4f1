pub(crate) mod insert;
pub(crate) mod lookup;

pub(crate) use insert::insert_route;
pub(crate) use lookup::{Captures, lookup_route};
