pub mod text_collector;
pub use text_collector::*;

pub mod literal;
pub use literal::*;

pub mod column;
pub use column::*;

pub mod function;
pub use function::*;

pub mod operators;
pub use operators::*;

pub mod expr;
pub use expr::*;

pub mod select_item;
pub use select_item::*;

pub mod source;
pub use source::*;

pub mod join;
pub use join::*;

pub mod order_by;
pub use order_by::*;

pub mod statement;
pub use statement::*;
