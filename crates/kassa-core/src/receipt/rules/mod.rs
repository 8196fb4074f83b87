//! Rule-based building blocks of receipt parsing.

pub mod blocks;
pub mod numbers;
pub mod patterns;
pub mod price;
pub mod sections;

pub use blocks::{BlockAssembler, ItemBlock};
pub use numbers::{find_candidates, parse_number, repair_stuck_digits};
pub use price::{
    clean_item_name, duplicate_heuristic, formula_match, positional_fallback, PriceResolver,
    ResolvedItem,
};
pub use sections::{declared_total, ItemSection, SectionLocator};
