//! Entity-component storage
//!
//! - `column`: per-type tombstoned slot storage
//! - `index`: entity ids, handles, observers and iteration

mod column;
pub mod index;

pub use index::{
    Bundle, ComponentCallback, Cursor, EntityHandle, EntityId, EntityIndex, EntityRef,
};
