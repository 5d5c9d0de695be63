pub mod check;
pub mod satisfies;
