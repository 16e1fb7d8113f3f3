pub mod elements;
pub mod mendeleev;
